// Core types shared by the sampler, compositor and raster surface.

/// One frame of pixels as the window shows them.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,     // how wide the surface is (pixels)
    pub height: usize,    // how tall the surface is (pixels)
    pub pixels: Vec<u32>, // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Self { width, height, pixels: vec![fill; width * height] }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    #[inline]
    pub fn unpack(px: u32) -> Self {
        Self {
            r: ((px >> 16) & 0xFF) as u8,
            g: ((px >> 8) & 0xFF) as u8,
            b: (px & 0xFF) as u8,
        }
    }
}

/// Coarse grid of normalized intensities, one value per display cell.
///
/// Built wholesale by the sampler and never mutated afterwards; a resize
/// produces a brand-new grid that replaces the old one in a single swap.
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid {
    cols: usize,
    rows: usize,
    cell_size: u32,
    values: Vec<f32>, // length = cols * rows, row-major, each in [0.0, 1.0]
}

impl LuminanceGrid {
    /// Returns `None` when the dimensions are empty or don't match the buffer.
    pub fn new(cols: usize, rows: usize, cell_size: u32, mut values: Vec<f32>) -> Option<Self> {
        if cols == 0 || rows == 0 || cell_size == 0 || values.len() != cols * rows {
            return None;
        }
        for v in &mut values {
            *v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        }
        Some(Self { cols, rows, cell_size, values })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// True when the buffer still matches the recorded dimensions.
    pub fn is_consistent(&self) -> bool {
        self.values.len() == self.cols * self.rows
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }
}
