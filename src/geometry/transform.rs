use crate::geometry::vertex::{TransformedVertex, Vertex};
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3, Vector4};

/// Below this |w| the perspective divide is skipped.
const W_EPSILON: f32 = 1e-8;

/// Transform bundle for one renderable object in one frame.
/// Composes as `viewport · projection · view · model`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub viewport: Matrix4<f32>,
}

impl Default for Uniform {
    fn default() -> Self {
        Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            viewport: Matrix4::identity(),
        }
    }
}

/// Transform stage: model space to screen space.
///
/// The perspective divide happens before the viewport matrix, which then acts
/// as an affine remap of normalized device coordinates. Nothing is clipped.
///
/// The normal is passed through in model space, without the inverse-transpose
/// correction. Lighting is therefore evaluated against unrotated normals,
/// which biases shading on rotating or non-uniformly scaled bodies toward
/// their rest orientation.
pub fn vertex_shader(vertex: &Vertex, uniform: &Uniform) -> TransformedVertex {
    let view_position = uniform.view * uniform.model * vertex.position.to_homogeneous();
    let clip = uniform.projection * view_position;

    let ndc = if clip.w.abs() > W_EPSILON {
        Vector4::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w, 1.0)
    } else {
        Vector4::new(clip.x, clip.y, clip.z, 1.0)
    };
    let screen = uniform.viewport * ndc;

    TransformedVertex {
        position: Point3::new(screen.x, screen.y, screen.z),
        normal: vertex.normal,
        original: vertex.original,
        // Right-handed view space looks down -z
        z: -view_position.z,
    }
}

/// Factory for the matrices the frame driver composes into a `Uniform`.
pub struct TransformFactory;

impl TransformFactory {
    /// Rotation about an arbitrary axis
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let axis_unit = Unit::new_normalize(*axis);
        Matrix4::from(Rotation3::from_axis_angle(&axis_unit, angle_rad))
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translation)
    }

    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(scale)
    }

    /// Look-at view matrix
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(eye, target, &Unit::new_normalize(*up))
    }

    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect_ratio, fov_y_rad, near, far)
    }

    /// `scale(w/2, h/2, 0.5) · translate(1, 1, 0.5)`: NDC x/y in [-1, 1] map to
    /// [0, width] x [0, height] with y growing upward, and depth becomes
    /// `(z + 0.5) * 0.5`.
    pub fn viewport(width: usize, height: usize) -> Matrix4<f32> {
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(
            width as f32 / 2.0,
            height as f32 / 2.0,
            0.5,
        ));
        let translate = Matrix4::new_translation(&Vector3::new(1.0, 1.0, 0.5));
        scale * translate
    }
}
