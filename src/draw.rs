// Software drawing onto a FrameBuffer: the raster surface the compositor
// paints glyphs into, plus small overlay helpers (crosshair, HUD text).

use crate::compositor::Canvas;
use crate::font::{glyph5x7, glyph_scale, GLYPH_W};
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, Rgb};

/// A FrameBuffer with a background color and a current fill style.
pub struct RasterSurface {
    fb: FrameBuffer,
    background: u32,
    lut: GammaLut,
    fill: Rgb,
    fill_alpha: f32,
    scale: i32,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Self {
            fb: FrameBuffer::new(width, height, background),
            background,
            lut: GammaLut::new(),
            fill: Rgb::new(0, 0, 0),
            fill_alpha: 1.0,
            scale: 1,
        }
    }

    /// Reallocate for a new window size. Contents are reset to background.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.fb.width && height == self.fb.height {
            return;
        }
        self.fb = FrameBuffer::new(width, height, self.background);
    }

    /// Glyph upscale factor for a given cell size.
    pub fn set_cell_size(&mut self, cell_size: u32) {
        self.scale = glyph_scale(cell_size);
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.fb
    }

    #[inline]
    fn blend_pixel(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.fb.width || y >= self.fb.height {
            return;
        }
        let idx = y * self.fb.width + x;
        self.fb.pixels[idx] = self.lut.blend_over(self.fb.pixels[idx], self.fill, self.fill_alpha);
    }
}

impl Canvas for RasterSurface {
    fn size(&self) -> (usize, usize) {
        (self.fb.width, self.fb.height)
    }

    fn clear(&mut self) {
        self.fb.pixels.fill(self.background);
    }

    fn set_fill(&mut self, color: Rgb, alpha: f32) {
        self.fill = color;
        self.fill_alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_glyph(&mut self, ch: char, x: i32, y: i32) {
        let Some(rows) = glyph5x7(ch) else { return };
        let s = self.scale;
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..GLYPH_W {
                if (rowbits & (1 << (4 - rx))) == 0 {
                    continue;
                }
                let px = x + rx * s;
                let py = y + ry as i32 * s;
                for oy in 0..s {
                    for ox in 0..s {
                        self.blend_pixel(px + ox, py + oy);
                    }
                }
            }
        }
    }
}

/* ---------- Overlay helpers (opaque, unscaled) ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a small crosshair centered at (cx,cy), with a gap at the center.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    for d in 2..=size {
        put_pixel(fb, cx - d, cy, color);
        put_pixel(fb, cx + d, cy, color);
        put_pixel(fb, cx, cy - d, color);
        put_pixel(fb, cx, cy + d, color);
    }
    put_pixel(fb, cx, cy, color);
}

/// Draw a single 5x7 character with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (shift, c) in [(1, 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..GLYPH_W {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx + shift, y + ry as i32 + shift, c);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs, 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += GLYPH_W + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: u32 = 0x00F5F0E8;

    #[test_log::test]
    fn clear_restores_background() {
        let mut s = RasterSurface::new(8, 8, BG);
        s.set_fill(Rgb::new(0, 0, 0), 1.0);
        s.fill_glyph('#', 0, 0);
        assert!(s.frame().pixels.iter().any(|&p| p != BG));
        s.clear();
        assert!(s.frame().pixels.iter().all(|&p| p == BG));
    }

    #[test_log::test]
    fn glyph_is_clipped_at_edges() {
        let mut s = RasterSurface::new(4, 4, BG);
        s.set_fill(Rgb::new(0, 0, 0), 1.0);
        s.fill_glyph('@', -2, -3);
        s.fill_glyph('@', 3, 3);
        assert_eq!(s.frame().pixels.len(), 16);
    }

    #[test_log::test]
    fn opaque_fill_writes_exact_color() {
        let mut s = RasterSurface::new(5, 7, BG);
        let rust = Rgb::new(173, 77, 55);
        s.set_fill(rust, 1.0);
        s.fill_glyph('|', 0, 0);
        // '|' is the middle column on every row.
        for y in 0..7 {
            assert_eq!(s.frame().pixels[y * 5 + 2], rust.pack());
            assert_eq!(s.frame().pixels[y * 5], BG);
        }
    }

    #[test_log::test]
    fn scaled_glyph_covers_blocks() {
        let mut s = RasterSurface::new(10, 14, BG);
        s.set_cell_size(15); // scale 2
        s.set_fill(Rgb::new(0, 0, 0), 1.0);
        s.fill_glyph('|', 0, 0);
        for y in 0..14 {
            assert_eq!(s.frame().pixels[y * 10 + 4], 0);
            assert_eq!(s.frame().pixels[y * 10 + 5], 0);
        }
    }

    #[test_log::test]
    fn hud_text_draws_something() {
        let mut fb = FrameBuffer::new(64, 16, 0);
        draw_text_5x7(&mut fb, 1, 1, "FPS: 60.0", 0x00FFFFFF);
        assert!(fb.pixels.iter().any(|&p| p == 0x00FFFFFF));
    }
}
