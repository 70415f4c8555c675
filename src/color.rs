// src/color.rs

//! Defines the linear `Rgba` colour used by both render passes and its
//! conversion to 8-bit pixels.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A linear RGBA colour with `f32` components.
///
/// Components are not clamped on construction; additive line blending can
/// push them above 1.0 and clamping happens once, at quantisation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(rgb: Vec3, a: f32) -> Self {
        Self::new(rgb.x, rgb.y, rgb.z, a)
    }

    pub fn rgb(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// `src·α + dst·(1 - α)`, the surface pass blend. Destination alpha is kept.
    pub fn blend_over(self, src: Rgba) -> Rgba {
        let rgb = src.rgb() * src.a + self.rgb() * (1.0 - src.a);
        Rgba::from_rgb(rgb, self.a)
    }

    /// `dst + src·α`, the line pass blend.
    pub fn blend_additive(self, src: Rgba) -> Rgba {
        Rgba::from_rgb(self.rgb() + src.rgb() * src.a, self.a)
    }

    /// Quantises to 8-bit RGB, clamping each channel to `[0, 1]` first.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let q = |c: f32| {
            if c.is_nan() {
                0
            } else {
                (c.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        [q(self.r), q(self.g), q(self.b)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_blend_weights_by_source_alpha() {
        let dst = Rgba::BLACK;
        let out = dst.blend_over(Rgba::new(1.0, 0.5, 0.0, 0.6));
        assert!((out.r - 0.6).abs() < 1e-6);
        assert!((out.g - 0.3).abs() < 1e-6);
        assert_eq!(out.a, 1.0);
    }

    #[test]
    fn additive_blend_accumulates() {
        let line = Rgba::new(0.5, 0.25, 0.5, 0.4);
        let out = Rgba::BLACK.blend_additive(line).blend_additive(line);
        assert!((out.r - 0.4).abs() < 1e-6);
        assert!((out.g - 0.2).abs() < 1e-6);
    }

    #[test]
    fn quantisation_clamps_out_of_range_channels() {
        assert_eq!(Rgba::new(2.0, -1.0, 0.5, 1.0).to_rgb8(), [255, 0, 128]);
        assert_eq!(Rgba::new(f32::NAN, 0.0, 1.0, 1.0).to_rgb8(), [0, 0, 255]);
    }
}
