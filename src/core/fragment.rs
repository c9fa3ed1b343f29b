use crate::material_system::color::Rgba;
use nalgebra::{Point3, Vector3};

/// Candidate pixel contribution produced by the rasterizer.
///
/// Consumed immediately by the depth resolver and, when it wins, by the
/// fragment shader of the owning object. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Pixel column
    pub x: usize,
    /// Pixel row, bottom-up
    pub y: usize,
    /// Provisional colour: interpolated base colour scaled by `intensity`
    pub color: Rgba,
    /// Interpolated viewport depth, smaller is closer
    pub depth: f32,
    /// Interpolated untransformed position, input for procedural shading
    pub original: Point3<f32>,
    /// Interpolated (unnormalized) model-space normal
    pub normal: Vector3<f32>,
    /// Scalar light intensity, always positive for emitted fragments
    pub intensity: f32,
}
