// Gamma-correct alpha blending through lookup tables.
// Glyph edges blended at partial opacity stay free of dark fringes, and no
// powf runs in the per-pixel path.

use crate::types::Rgb;

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), index = (linear * 4095).round()
    linear_to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Composite `src` over the packed pixel `dst` with coverage `alpha`.
    #[inline]
    pub fn blend_over(&self, dst: u32, src: Rgb, alpha: f32) -> u32 {
        let a = alpha.clamp(0.0, 1.0);
        if a >= 1.0 {
            return src.pack();
        }
        if a <= 0.0 {
            return dst;
        }
        let d = Rgb::unpack(dst);
        let mix = |bg: u8, fg: u8| {
            let l = self.srgb_u8_to_linear(bg) * (1.0 - a) + self.srgb_u8_to_linear(fg) * a;
            self.linear_to_srgb_u8(l)
        };
        Rgb::new(mix(d.r, src.r), mix(d.g, src.g), mix(d.b, src.b)).pack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn endpoints_round_trip() {
        let lut = GammaLut::new();
        for v in [0u8, 1, 128, 254, 255] {
            assert_eq!(lut.linear_to_srgb_u8(lut.srgb_u8_to_linear(v)), v);
        }
    }

    #[test_log::test]
    fn blend_extremes() {
        let lut = GammaLut::new();
        let fg = Rgb::new(173, 77, 55);
        assert_eq!(lut.blend_over(0x00FFFFFF, fg, 1.0), fg.pack());
        assert_eq!(lut.blend_over(0x00FFFFFF, fg, 0.0), 0x00FFFFFF);
    }

    #[test_log::test]
    fn half_blend_is_brighter_than_naive_average() {
        let lut = GammaLut::new();
        let out = Rgb::unpack(lut.blend_over(0x00000000, Rgb::new(255, 255, 255), 0.5));
        // Linear-light midpoint of black/white is ~188 in sRGB, not 128.
        assert!(out.r > 180 && out.r < 195, "got {}", out.r);
    }
}
