use crate::core::frame_buffer::DepthLocking;
use crate::geometry::camera::Camera;
use crate::geometry::interpolation::DEFAULT_BARYCENTRIC_TOLERANCE;
use crate::material_system::color::Rgba;
use crate::scene::solar_system::{BodyConfig, default_bodies};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

/// Every parameter the TOML file can set. Vector-valued entries are kept as
/// `"x,y,z"` strings, the format the file uses, and parsed on demand.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    // ===== files =====
    /// Stem of every written frame
    pub output: String,
    pub output_dir: String,

    // ===== meshes =====
    /// Mesh name -> OBJ path
    pub meshes: BTreeMap<String, String>,

    // ===== render =====
    pub width: usize,
    pub height: usize,
    /// Number of ticks to simulate and save
    pub frames: usize,
    /// Allowed deviation of `u + v + w` from one in the containment test
    pub barycentric_tolerance: f32,
    pub use_multithreading: bool,
    /// `"global"` or `"banded"`
    pub depth_lock: String,
    /// Rows per band when `depth_lock` is `"banded"`
    pub depth_lock_rows: usize,
    /// 0-255 channels, `"r,g,b"`
    pub clear_color: String,
    pub save_depth: bool,
    /// Gamma for the depth visualisation
    pub use_gamma: bool,

    // ===== camera =====
    pub camera_position: String,
    pub camera_up: String,
    /// Degrees
    pub camera_yaw: f32,
    /// Degrees
    pub camera_pitch: f32,
    pub camera_target_distance: f32,
    /// Vertical field of view, degrees
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,

    // ===== bodies =====
    pub bodies: Vec<BodyConfig>,
}

pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("Expected 3 comma-separated values, got '{}'", s));
    }
    let x = parts[0]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[0], e))?;
    let y = parts[1]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[1], e))?;
    let z = parts[2]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[2], e))?;
    Ok(Vector3::new(x, y, z))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

/// `"r,g,b"` with each channel in 0..=255, opaque.
pub fn parse_rgb(s: &str) -> Result<Rgba, String> {
    let v = parse_vec3(s)?;
    let channel = |c: f32| {
        if (0.0..=255.0).contains(&c) {
            Ok(c.round() as u8)
        } else {
            Err(format!("Colour channel {} out of range 0-255 in '{}'", c, s))
        }
    };
    Ok(Rgba::rgb(channel(v.x)?, channel(v.y)?, channel(v.z)?))
}

impl Default for RenderSettings {
    fn default() -> Self {
        let meshes = [
            ("planet".to_string(), "models/sphere.obj".to_string()),
            ("ship".to_string(), "models/ship.obj".to_string()),
        ]
        .into_iter()
        .collect();

        Self {
            output: "frame".to_string(),
            output_dir: "output".to_string(),

            meshes,

            width: 720,
            height: 480,
            frames: 1,
            barycentric_tolerance: DEFAULT_BARYCENTRIC_TOLERANCE,
            use_multithreading: true,
            depth_lock: "global".to_string(),
            depth_lock_rows: 16,
            clear_color: "0,0,0".to_string(),
            save_depth: false,
            use_gamma: false,

            camera_position: "0,0,17".to_string(),
            camera_up: "0,1,0".to_string(),
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            camera_target_distance: 5.0,
            camera_fov: 45.0,
            camera_near: 0.1,
            camera_far: 100.0,

            bodies: default_bodies(),
        }
    }
}

impl RenderSettings {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn depth_locking(&self) -> Result<DepthLocking, String> {
        match self.depth_lock.as_str() {
            "global" => Ok(DepthLocking::Global),
            "banded" => Ok(DepthLocking::Banded {
                rows: self.depth_lock_rows.max(1),
            }),
            other => Err(format!("Unknown depth_lock mode '{}'", other)),
        }
    }

    pub fn clear_color_rgba(&self) -> Result<Rgba, String> {
        parse_rgb(&self.clear_color)
    }

    /// Checks everything a frame loop needs before any mesh is loaded.
    pub fn validate(&self) -> Result<(), String> {
        if self.width < 3 || self.height < 3 {
            return Err(format!(
                "Image size {}x{} is too small, both sides must be at least 3",
                self.width, self.height
            ));
        }
        if !(self.barycentric_tolerance >= 0.0) {
            return Err(format!(
                "barycentric_tolerance must be non-negative, got {}",
                self.barycentric_tolerance
            ));
        }
        if !(self.camera_near > 0.0 && self.camera_far > self.camera_near) {
            return Err(format!(
                "Invalid clip planes near={} far={}",
                self.camera_near, self.camera_far
            ));
        }
        if !(self.camera_fov > 0.0 && self.camera_fov < 180.0) {
            return Err(format!("Invalid field of view {}", self.camera_fov));
        }
        if !(self.camera_target_distance > 0.0) {
            return Err(format!(
                "camera target_distance must be positive, got {}",
                self.camera_target_distance
            ));
        }

        self.depth_locking()?;
        self.clear_color_rgba()?;
        parse_point3(&self.camera_position)?;
        let up = parse_vec3(&self.camera_up)?;
        if up.norm_squared() < 1e-12 {
            return Err("camera up vector must not be zero".to_string());
        }
        let forward = Camera::direction(self.camera_yaw, self.camera_pitch);
        if forward.cross(&up.normalize()).norm() < 1e-4 {
            return Err(format!(
                "camera pitch {} looks along the up vector",
                self.camera_pitch
            ));
        }

        for body in &self.bodies {
            if !self.meshes.contains_key(&body.mesh) {
                return Err(format!(
                    "Body '{}' uses mesh '{}' which is not listed under [meshes]",
                    body.name, body.mesh
                ));
            }
        }
        Ok(())
    }
}
