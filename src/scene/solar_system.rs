//! The animated scene: an enclosing sky sphere, the sun, six orbiting
//! planets and a craft that follows the camera.
//!
//! Bodies are plain data (`BodyConfig`) so the configuration file decides what
//! exists; the renderer only ever sees the `RenderObject`s built per frame.

use crate::geometry::camera::Camera;
use crate::geometry::transform::{TransformFactory, Uniform};
use crate::geometry::vertex::Vertex;
use crate::material_system::color::Rgba;
use crate::material_system::shaders::ObjectKind;
use crate::scene::scene_object::RenderObject;
use log::debug;
use nalgebra::{Matrix4, Vector3};
use std::collections::HashMap;
use std::sync::Arc;

/// How a body's model matrix evolves from tick to tick.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyMotion {
    /// Static placement: `translate · scale`
    Fixed {
        translation: Vector3<f32>,
        scale: Vector3<f32>,
    },
    /// Circle in the xz-plane plus self-rotation:
    /// `translate(circle) · scale · rotate(spin_axis, spin)`.
    /// `speed` is radians of orbit per tick, `spin_speed` degrees of spin per tick.
    Orbit {
        radius: f32,
        speed: f32,
        scale: f32,
        spin_axis: Vector3<f32>,
        spin_speed: f32,
    },
    /// Placed `ratio` of the way from the eye to the target and `drop` below
    /// it, turned against the camera yaw (about y) and pitch (about z).
    FollowCamera { scale: f32, ratio: f32, drop: f32 },
}

impl BodyMotion {
    pub fn name(&self) -> &'static str {
        match self {
            BodyMotion::Fixed { .. } => "fixed",
            BodyMotion::Orbit { .. } => "orbit",
            BodyMotion::FollowCamera { .. } => "follow_camera",
        }
    }
}

/// Configuration of one body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyConfig {
    pub name: String,
    pub kind: ObjectKind,
    /// Key into the loaded mesh table
    pub mesh: String,
    pub motion: BodyMotion,
}

impl BodyConfig {
    pub fn new(name: &str, kind: ObjectKind, mesh: &str, motion: BodyMotion) -> Self {
        BodyConfig {
            name: name.to_string(),
            kind,
            mesh: mesh.to_string(),
            motion,
        }
    }

    fn planet(kind: ObjectKind, radius: f32, speed: f32, scale: f32, spin_speed: f32) -> Self {
        BodyConfig::new(
            kind.name(),
            kind,
            "planet",
            BodyMotion::Orbit {
                radius,
                speed,
                scale,
                spin_axis: Vector3::y(),
                spin_speed,
            },
        )
    }
}

/// The default scene: sky, sun, six planets and the craft.
pub fn default_bodies() -> Vec<BodyConfig> {
    vec![
        BodyConfig::new(
            "space",
            ObjectKind::Space,
            "planet",
            BodyMotion::Fixed {
                translation: Vector3::new(0.0, 0.0, -10.0),
                scale: Vector3::new(40.0, 40.0, 10.0),
            },
        ),
        BodyConfig::planet(ObjectKind::Sun, 0.0, 0.01, 1.5, 0.7),
        BodyConfig::planet(ObjectKind::Earth, 2.0, 0.2, 0.5, 2.45),
        BodyConfig::planet(ObjectKind::Mars, 2.5, 0.15, 0.45, 2.1),
        BodyConfig::planet(ObjectKind::Jupiter, 3.5, 0.07, 0.8, 1.05),
        BodyConfig::planet(ObjectKind::Saturn, 4.5, 0.09, 0.65, 1.4),
        BodyConfig::planet(ObjectKind::Uranus, 5.5, 0.1, 0.6, 1.4),
        BodyConfig::planet(ObjectKind::Neptune, 6.25, 0.085, 0.7, 1.4),
        BodyConfig::new(
            "ship",
            ObjectKind::Ship,
            "ship",
            BodyMotion::FollowCamera {
                scale: 0.05,
                ratio: 1.0 / 3.0,
                drop: 0.15,
            },
        ),
    ]
}

/// Point on a circle of `radius` in the xz-plane.
pub fn position_in_circle(angle_rad: f32, radius: f32) -> Vector3<f32> {
    Vector3::new(angle_rad.cos() * radius, 0.0, angle_rad.sin() * radius)
}

struct Body {
    config: BodyConfig,
    mesh: Arc<[Vertex]>,
    /// Radians
    orbit_angle: f32,
    /// Degrees
    spin_angle: f32,
}

impl Body {
    fn model_matrix(&self, camera: &Camera) -> Matrix4<f32> {
        match &self.config.motion {
            BodyMotion::Fixed { translation, scale } => {
                TransformFactory::translation(translation)
                    * TransformFactory::scaling_nonuniform(scale)
            }
            BodyMotion::Orbit {
                radius,
                scale,
                spin_axis,
                ..
            } => {
                let translation = position_in_circle(self.orbit_angle, *radius);
                TransformFactory::translation(&translation)
                    * TransformFactory::scaling_nonuniform(&Vector3::repeat(*scale))
                    * TransformFactory::rotation(spin_axis, self.spin_angle.to_radians())
            }
            BodyMotion::FollowCamera { scale, ratio, drop } => {
                let forward = camera.target - camera.position;
                let anchor = camera.position + forward * *ratio - camera.up * *drop;
                TransformFactory::translation(&anchor.coords)
                    * TransformFactory::scaling_nonuniform(&Vector3::repeat(*scale))
                    * TransformFactory::rotation(&Vector3::y(), (-camera.yaw).to_radians())
                    * TransformFactory::rotation(&Vector3::z(), (-camera.pitch).to_radians())
            }
        }
    }
}

/// Animated set of bodies sharing a mesh table.
pub struct SolarSystem {
    bodies: Vec<Body>,
}

impl SolarSystem {
    /// Binds every body to its mesh. A body naming a mesh that was not
    /// loaded is an error.
    pub fn new(
        configs: &[BodyConfig],
        meshes: &HashMap<String, Arc<[Vertex]>>,
    ) -> Result<Self, String> {
        let bodies = configs
            .iter()
            .map(|config| {
                let mesh = meshes.get(&config.mesh).ok_or_else(|| {
                    format!("Body '{}' uses unknown mesh '{}'", config.name, config.mesh)
                })?;
                Ok(Body {
                    config: config.clone(),
                    mesh: Arc::clone(mesh),
                    orbit_angle: 0.0,
                    spin_angle: 0.0,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(SolarSystem { bodies })
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Advances every orbit and spin by one step.
    pub fn tick(&mut self) {
        for body in &mut self.bodies {
            if let BodyMotion::Orbit {
                speed, spin_speed, ..
            } = body.config.motion
            {
                body.orbit_angle += speed;
                body.spin_angle = (body.spin_angle + spin_speed) % 360.0;
            }
        }
    }

    /// Builds this frame's render objects, in body order.
    pub fn render_objects(&self, camera: &Camera, viewport: &Matrix4<f32>) -> Vec<RenderObject> {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        self.bodies
            .iter()
            .map(|body| {
                let uniform = Uniform {
                    model: body.model_matrix(camera),
                    view,
                    projection,
                    viewport: *viewport,
                };
                debug!(
                    "{} ({}): orbit {:.3} rad, spin {:.1} deg",
                    body.config.name,
                    body.config.motion.name(),
                    body.orbit_angle,
                    body.spin_angle
                );
                RenderObject::new(
                    body.config.name.clone(),
                    Arc::clone(&body.mesh),
                    uniform,
                    body.config.kind,
                )
                .with_base_color(Rgba::BLACK)
            })
            .collect()
    }
}
