use nalgebra::Vector3;
use std::ops::Mul;

/// Linear RGB colour with float components in [0.0, 1.0], used by shaders.
pub type Color = Vector3<f32>;

/// Four independent 8-bit channels, the format the pixel sink accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    #[cfg(test)]
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque colour from a linear float colour.
    pub fn from_linear(color: &Color, apply_gamma: bool) -> Self {
        let [r, g, b] = linear_rgb_to_u8(color, apply_gamma);
        Self::rgb(r, g, b)
    }

    /// Barycentric blend of three colours, channel by channel, rounded.
    pub fn interpolate(bary: Vector3<f32>, a: Rgba, b: Rgba, c: Rgba) -> Rgba {
        let channel = |x: u8, y: u8, z: u8| {
            (bary.x * x as f32 + bary.y * y as f32 + bary.z * z as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            channel(a.r, b.r, c.r),
            channel(a.g, b.g, c.g),
            channel(a.b, b.b, c.b),
            channel(a.a, b.a, c.a),
        )
    }
}

/// Scales the colour channels, rounding to nearest; alpha is kept.
impl Mul<f32> for Rgba {
    type Output = Rgba;

    fn mul(self, factor: f32) -> Rgba {
        let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Rgba::new(scale(self.r), scale(self.g), scale(self.b), self.a)
    }
}

/// Applies gamma 2.2 to a linear colour.
pub fn apply_gamma_correction(linear_color: &Color) -> Color {
    let inv_gamma = 1.0 / 2.2;
    Color::new(
        linear_color.x.powf(inv_gamma),
        linear_color.y.powf(inv_gamma),
        linear_color.z.powf(inv_gamma),
    )
}

/// Converts a linear colour to three clamped 8-bit channels.
pub fn linear_rgb_to_u8(linear_color: &Color, apply_gamma: bool) -> [u8; 3] {
    let display_color = if apply_gamma {
        apply_gamma_correction(linear_color)
    } else {
        *linear_color
    };

    [
        (display_color.x * 255.0).clamp(0.0, 255.0) as u8,
        (display_color.y * 255.0).clamp(0.0, 255.0) as u8,
        (display_color.z * 255.0).clamp(0.0, 255.0) as u8,
    ]
}

/// Linear blend between two colours, `t` clamped to [0, 1].
pub fn mix(a: &Color, b: &Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Converts a normalized depth map (values 0.0-1.0) into an RGB image using
/// the JET colormap. Non-finite values become black pixels.
pub fn apply_colormap_jet(normalized_depth: &[f32], apply_gamma: bool) -> Vec<u8> {
    let mut result = vec![0u8; normalized_depth.len() * 3];

    for (index, &depth) in normalized_depth.iter().enumerate() {
        if !depth.is_finite() {
            continue;
        }
        let value = depth.clamp(0.0, 1.0);

        let mut r = 0.0;
        let g;
        let mut b = 0.0;

        if value <= 0.25 {
            // Blue to Cyan
            b = 1.0;
            g = value * 4.0;
        } else if value <= 0.5 {
            // Cyan to Green
            g = 1.0;
            b = 1.0 - (value - 0.25) * 4.0;
        } else if value <= 0.75 {
            // Green to Yellow
            g = 1.0;
            r = (value - 0.5) * 4.0;
        } else {
            // Yellow to Red
            r = 1.0;
            g = 1.0 - (value - 0.75) * 4.0;
        }

        let [r_u8, g_u8, b_u8] = linear_rgb_to_u8(&Color::new(r, g, b), apply_gamma);
        let base_index = index * 3;
        result[base_index] = r_u8;
        result[base_index + 1] = g_u8;
        result[base_index + 2] = b_u8;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_keeps_alpha() {
        assert_eq!(Rgba::new(200, 100, 50, 255) * 0.5, Rgba::new(100, 50, 25, 255));
        assert_eq!(Rgba::rgb(200, 100, 50) * 2.0, Rgba::rgb(255, 200, 100));
        assert_eq!(Rgba::rgb(200, 100, 50) * -1.0, Rgba::rgb(0, 0, 0));
    }

    #[test]
    fn test_interpolate_flat_colour() {
        let c = Rgba::rgb(90, 60, 30);
        let bary = Vector3::new(0.2, 0.3, 0.5);
        assert_eq!(Rgba::interpolate(bary, c, c, c), c);
    }

    #[test]
    fn test_colormap_marks_missing_depth_black() {
        let out = apply_colormap_jet(&[0.0, f32::INFINITY, 1.0], false);
        assert_eq!(&out[0..3], &[0, 0, 255]);
        assert_eq!(&out[3..6], &[0, 0, 0]);
        assert_eq!(&out[6..9], &[255, 0, 0]);
    }
}
