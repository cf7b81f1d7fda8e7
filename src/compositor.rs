// Glyph compositor: luminance grid + ripple field -> characters on a canvas.
//
// Each frame walks the grid, pushes every cell's sampling point through the
// ripple field, picks a character from the density ramp and a color bucket
// from the displaced luminance, then paints bucket by bucket so each fill
// style is set once per frame.

use std::time::Duration;

use log::trace;

use crate::ripple::RippleField;
use crate::types::{LuminanceGrid, Rgb};

/// Character ramp, lightest -> densest.
pub const RAMP: &str = " `·.,:;~=+ilI1tfjrxnuvczXYUJCLQ0OZmwqpdbkh#MW&8%B@$";
/// Cells brighter than this are page background and are not drawn.
pub const BACKGROUND_THRESHOLD: f32 = 0.88;
/// Below this global opacity a frame draws nothing.
pub const MIN_VISIBLE_OPACITY: f32 = 0.005;

/// Anything the compositor can paint glyphs onto.
pub trait Canvas {
    fn size(&self) -> (usize, usize);
    fn clear(&mut self);
    fn set_fill(&mut self, color: Rgb, alpha: f32);
    /// Paint `ch` with its top-left corner at (x,y) using the current fill.
    fn fill_glyph(&mut self, ch: char, x: i32, y: i32);
}

/// One quantized fill style: luminance strictly above `min_lum` selects it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorBucket {
    pub min_lum: f32,
    pub color: Rgb,
    pub alpha: f32,
}

const RUST: Rgb = Rgb::new(173, 77, 55);

/// Warm portrait palette; first match wins, the last entry catches the rest.
pub const DEFAULT_PALETTE: [ColorBucket; 7] = [
    ColorBucket { min_lum: 0.72, color: RUST, alpha: 1.0 },
    ColorBucket { min_lum: 0.58, color: RUST, alpha: 1.0 },
    ColorBucket { min_lum: 0.44, color: RUST, alpha: 1.0 },
    ColorBucket { min_lum: 0.32, color: RUST, alpha: 1.0 },
    ColorBucket { min_lum: 0.20, color: RUST, alpha: 1.0 },
    ColorBucket { min_lum: 0.10, color: Rgb::new(210, 175, 115), alpha: 0.96 },
    ColorBucket { min_lum: f32::NEG_INFINITY, color: Rgb::new(220, 185, 120), alpha: 1.0 },
];

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub glyphs: usize,
    pub fill_changes: usize,
    pub skipped_stale: bool,
}

/// Ramp index for a luminance: dark -> dense.
#[inline]
pub fn ramp_char(ramp: &[char], lum: f32) -> char {
    let last = ramp.len().saturating_sub(1);
    let idx = ((1.0 - lum.clamp(0.0, 1.0)) * last as f32).floor() as usize;
    ramp[idx.min(last)]
}

#[derive(Clone, Copy, Debug)]
struct Placed {
    ch: char,
    x: i32,
    y: i32,
}

pub struct GlyphCompositor {
    cell_size: u32,
    ramp: Vec<char>,
    // Distinct fill styles and, per palette entry, which style it uses.
    styles: Vec<(Rgb, f32)>,
    bucket_style: Vec<usize>,
    palette: Vec<ColorBucket>,
    // Per-style scratch lists, reused every frame.
    scratch: Vec<Vec<Placed>>,
}

impl GlyphCompositor {
    pub fn new(cell_size: u32) -> Self {
        Self::with_palette(cell_size, &DEFAULT_PALETTE)
    }

    pub fn with_palette(cell_size: u32, palette: &[ColorBucket]) -> Self {
        let mut styles: Vec<(Rgb, f32)> = Vec::new();
        let mut bucket_style = Vec::with_capacity(palette.len());
        for b in palette {
            let idx = match styles.iter().position(|&(c, a)| c == b.color && a == b.alpha) {
                Some(i) => i,
                None => {
                    styles.push((b.color, b.alpha));
                    styles.len() - 1
                }
            };
            bucket_style.push(idx);
        }
        let scratch = vec![Vec::new(); styles.len()];
        Self {
            cell_size: cell_size.max(1),
            ramp: RAMP.chars().collect(),
            styles,
            bucket_style,
            palette: palette.to_vec(),
            scratch,
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Palette index for a luminance, or `None` for background.
    pub fn bucket_for(&self, lum: f32) -> Option<usize> {
        if lum > BACKGROUND_THRESHOLD {
            return None;
        }
        self.palette
            .iter()
            .position(|b| lum > b.min_lum)
            .or_else(|| self.palette.len().checked_sub(1))
    }

    /// Paint one frame. Does not clear the canvas.
    pub fn render(
        &mut self,
        grid: &LuminanceGrid,
        ripples: &RippleField,
        now: Duration,
        opacity: f32,
        canvas: &mut dyn Canvas,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let (cols, rows) = (grid.cols(), grid.rows());
        if grid.cell_size() != self.cell_size || !grid.is_consistent() {
            stats.skipped_stale = true;
            return stats;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < MIN_VISIBLE_OPACITY {
            return stats;
        }

        for list in &mut self.scratch {
            list.clear();
        }

        // A grid built for a larger surface is clipped, not rescaled.
        let (surface_w, surface_h) = canvas.size();
        let cell = self.cell_size as f32;
        let values = grid.values();
        for row in 0..rows {
            let y = row * self.cell_size as usize;
            if y >= surface_h {
                break;
            }
            for col in 0..cols {
                let x = col * self.cell_size as usize;
                if x >= surface_w {
                    break;
                }
                let cx = col as f32 * cell + cell * 0.5;
                let cy = row as f32 * cell + cell * 0.5;
                let (dx, dy) = if ripples.is_empty() { (0.0, 0.0) } else { ripples.displacement_at(cx, cy, now) };

                let sc = ((cx + dx) / cell - 0.5).round().clamp(0.0, (cols - 1) as f32) as usize;
                let sr = ((cy + dy) / cell - 0.5).round().clamp(0.0, (rows - 1) as f32) as usize;
                let lum = values[sr * cols + sc];

                let Some(bucket) = self.bucket_for(lum) else { continue };
                let ch = ramp_char(&self.ramp, lum);
                if ch == ' ' {
                    continue;
                }
                self.scratch[self.bucket_style[bucket]].push(Placed { ch, x: x as i32, y: y as i32 });
            }
        }

        for (style, list) in self.styles.iter().zip(&self.scratch) {
            if list.is_empty() {
                continue;
            }
            let (color, alpha) = *style;
            canvas.set_fill(color, alpha * opacity);
            stats.fill_changes += 1;
            for p in list {
                canvas.fill_glyph(p.ch, p.x, p.y);
            }
            stats.glyphs += list.len();
        }

        trace!("composited {} glyphs with {} fill changes", stats.glyphs, stats.fill_changes);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::RasterSurface;

    #[derive(Default)]
    struct Recorder {
        fills: Vec<(Rgb, f32)>,
        glyphs: Vec<(char, i32, i32, usize)>, // char, x, y, fill index
    }

    impl Canvas for Recorder {
        fn size(&self) -> (usize, usize) {
            (128, 128)
        }
        fn clear(&mut self) {
            self.fills.clear();
            self.glyphs.clear();
        }
        fn set_fill(&mut self, color: Rgb, alpha: f32) {
            self.fills.push((color, alpha));
        }
        fn fill_glyph(&mut self, ch: char, x: i32, y: i32) {
            let idx = self.fills.len().saturating_sub(1);
            self.glyphs.push((ch, x, y, idx));
        }
    }

    fn block_grid() -> LuminanceGrid {
        let mut values = vec![0.95f32; 16 * 16];
        for r in 6..10 {
            for c in 6..10 {
                values[r * 16 + c] = 0.05;
            }
        }
        LuminanceGrid::new(16, 16, 8, values).unwrap()
    }

    #[test_log::test]
    fn dark_block_draws_sixteen_glyphs_in_one_bucket() {
        let mut comp = GlyphCompositor::new(8);
        let mut rec = Recorder::default();
        let stats = comp.render(&block_grid(), &RippleField::default(), Duration::ZERO, 1.0, &mut rec);

        assert_eq!(stats.glyphs, 16);
        assert_eq!(stats.fill_changes, 1);
        assert_eq!(rec.glyphs.len(), 16);
        assert!(rec.glyphs.iter().all(|g| g.3 == 0));
        for &(_, x, y, _) in &rec.glyphs {
            assert!((48..80).contains(&x) && (48..80).contains(&y), "({x},{y})");
        }
        assert_eq!(rec.fills[0], (Rgb::new(220, 185, 120), 1.0));
    }

    #[test_log::test]
    fn buckets_follow_thresholds() {
        let comp = GlyphCompositor::new(8);
        assert_eq!(comp.bucket_for(0.95), None);
        assert_eq!(comp.bucket_for(0.89), None);
        assert_eq!(comp.bucket_for(0.88), Some(0));
        assert_eq!(comp.bucket_for(0.5), Some(2));
        assert_eq!(comp.bucket_for(0.15), Some(5));
        assert_eq!(comp.bucket_for(0.0), Some(6));
        // The five rust buckets share a style.
        assert_eq!(comp.styles.len(), 3);
    }

    #[test_log::test]
    fn ramp_maps_dark_to_dense() {
        let ramp: Vec<char> = RAMP.chars().collect();
        assert_eq!(ramp_char(&ramp, 0.0), '$');
        assert_eq!(ramp_char(&ramp, 1.0), ' ');
        assert_eq!(ramp_char(&ramp, 0.5), ramp[((ramp.len() - 1) as f32 * 0.5) as usize]);
    }

    #[test_log::test]
    fn mixed_luminance_groups_by_style() {
        let values = vec![0.05, 0.5, 0.15, 0.6, 0.05, 0.95];
        let grid = LuminanceGrid::new(3, 2, 8, values).unwrap();
        let mut comp = GlyphCompositor::new(8);
        let mut rec = Recorder::default();
        let stats = comp.render(&grid, &RippleField::default(), Duration::ZERO, 1.0, &mut rec);

        assert_eq!(stats.glyphs, 5);
        assert_eq!(stats.fill_changes, 3);
        // Draw calls under one fill are contiguous.
        let order: Vec<usize> = rec.glyphs.iter().map(|g| g.3).collect();
        assert!(order.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test_log::test]
    fn opacity_scales_fill_alpha() {
        let mut comp = GlyphCompositor::new(8);
        let mut rec = Recorder::default();
        comp.render(&block_grid(), &RippleField::default(), Duration::ZERO, 0.5, &mut rec);
        assert_eq!(rec.fills[0].1, 0.5);

        let mut rec = Recorder::default();
        let stats = comp.render(&block_grid(), &RippleField::default(), Duration::ZERO, 0.001, &mut rec);
        assert_eq!(stats.glyphs, 0);
        assert!(rec.fills.is_empty());
    }

    #[test_log::test]
    fn cells_beyond_the_surface_are_clipped() {
        struct Small(Recorder);
        impl Canvas for Small {
            fn size(&self) -> (usize, usize) {
                (56, 56) // seven cells: rows/cols 6 fit, 7..9 don't
            }
            fn clear(&mut self) {}
            fn set_fill(&mut self, color: Rgb, alpha: f32) {
                self.0.set_fill(color, alpha);
            }
            fn fill_glyph(&mut self, ch: char, x: i32, y: i32) {
                self.0.fill_glyph(ch, x, y);
            }
        }
        let mut comp = GlyphCompositor::new(8);
        let mut small = Small(Recorder::default());
        let stats = comp.render(&block_grid(), &RippleField::default(), Duration::ZERO, 1.0, &mut small);
        assert_eq!(stats.glyphs, 1);
        assert_eq!((small.0.glyphs[0].1, small.0.glyphs[0].2), (48, 48));
    }

    #[test_log::test]
    fn stale_grid_is_skipped() {
        let mut comp = GlyphCompositor::new(10);
        let mut rec = Recorder::default();
        let stats = comp.render(&block_grid(), &RippleField::default(), Duration::ZERO, 1.0, &mut rec);
        assert!(stats.skipped_stale);
        assert!(rec.glyphs.is_empty());
    }

    #[test_log::test]
    fn ripple_shifts_sampled_cells() {
        let grid = block_grid();
        let mut ripples = RippleField::default();
        ripples.set_geometry(128, 128, 8);
        // At t = 0.42s the ring's inner trough pulls cells just right of the
        // block back onto it.
        ripples.spawn(64.0, 64.0, 40.0, 100.0, Duration::ZERO);

        let mut comp = GlyphCompositor::new(8);
        let mut still = Recorder::default();
        let mut moved = Recorder::default();
        let now = Duration::from_millis(420);
        comp.render(&grid, &RippleField::default(), now, 1.0, &mut still);
        comp.render(&grid, &ripples, now, 1.0, &mut moved);
        assert_ne!(still.glyphs, moved.glyphs);
    }

    #[test_log::test]
    fn render_is_repeatable_on_raster() {
        let grid = block_grid();
        let mut ripples = RippleField::default();
        ripples.set_geometry(128, 128, 8);
        ripples.spawn(30.0, 40.0, 18.0, 300.0, Duration::ZERO);
        let now = Duration::from_millis(120);

        let mut comp = GlyphCompositor::new(8);
        let mut surface = RasterSurface::new(128, 128, 0x00F5F0E8);
        surface.set_cell_size(8);

        surface.clear();
        comp.render(&grid, &ripples, now, 0.8, &mut surface);
        let first = surface.frame().clone();
        surface.clear();
        comp.render(&grid, &ripples, now, 0.8, &mut surface);
        assert_eq!(&first, surface.frame());
    }
}
