use crate::geometry::transform::Uniform;
use crate::geometry::vertex::Vertex;
use crate::material_system::color::Rgba;
use crate::material_system::shaders::ObjectKind;
use log::warn;
use std::sync::Arc;

/// One renderable object for one frame.
///
/// The vertex list is pre-expanded (every three consecutive vertices form a
/// triangle) and shared read-only between frames and rendering tasks.
#[derive(Debug, Clone)]
pub struct RenderObject {
    pub name: String,
    pub mesh: Arc<[Vertex]>,
    pub uniform: Uniform,
    pub kind: ObjectKind,
    /// Colour interpolated across every triangle before lighting
    pub base_color: Rgba,
}

impl RenderObject {
    pub fn new(
        name: impl Into<String>,
        mesh: Arc<[Vertex]>,
        uniform: Uniform,
        kind: ObjectKind,
    ) -> Self {
        let name = name.into();
        if mesh.len() % 3 != 0 {
            warn!(
                "Object '{}' has {} vertices, not a multiple of 3; the last {} are ignored",
                name,
                mesh.len(),
                mesh.len() % 3
            );
        }
        RenderObject {
            name,
            mesh,
            uniform,
            kind,
            base_color: Rgba::BLACK,
        }
    }

    pub fn with_base_color(mut self, base_color: Rgba) -> Self {
        self.base_color = base_color;
        self
    }
}
