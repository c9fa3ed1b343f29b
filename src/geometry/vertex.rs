use nalgebra::{Point3, Vector3};

/// Per-mesh vertex record, created once at load time and shared read-only
/// between all rendering tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Model-space position
    pub position: Point3<f32>,
    /// Model-space normal
    pub normal: Vector3<f32>,
    /// Untransformed copy of `position`, fed to procedural shaders
    pub original: Point3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            original: position,
        }
    }
}

/// A vertex after the transform stage. Lives for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedVertex {
    /// Screen-space x/y (bottom-up y) and the viewport depth used by the depth test
    pub position: Point3<f32>,
    /// Passed through from the source vertex
    pub normal: Vector3<f32>,
    pub original: Point3<f32>,
    /// Camera-space distance in front of the eye; positive means in front
    pub z: f32,
}
