use crate::io::render_settings::{RenderSettings, parse_vec3};
use crate::material_system::shaders::ObjectKind;
use crate::scene::solar_system::{BodyConfig, BodyMotion};
use log::warn;
use nalgebra::Vector3;
use std::path::Path;
use toml::Value;

/// Reads and writes `RenderSettings` as TOML.
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            )
        })?;

        Self::load_from_content(&content)
    }

    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content)
            .map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// Writes the default scene as a commented, editable config file.
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = RenderSettings {
            frames: 60,
            save_depth: true,
            ..Default::default()
        };

        Self::save_to_file(&settings, path)
            .map_err(|e| format!("Failed to create example config: {}", e))
    }

    // ===== TOML -> RenderSettings =====

    fn parse_toml_to_settings(toml: Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        if let Some(files) = toml.get("files").and_then(|v| v.as_table()) {
            Self::parse_files_section(&mut settings, files)?;
        }

        if let Some(meshes) = toml.get("meshes").and_then(|v| v.as_table()) {
            Self::parse_meshes_section(&mut settings, meshes)?;
        }

        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render)?;
        }

        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera)?;
        }

        // A [[body]] array replaces the default scene entirely
        if toml.get("body").is_some() {
            settings.bodies = Self::parse_bodies_array(&toml)?;
        }

        Ok(settings)
    }

    fn parse_files_section(
        settings: &mut RenderSettings,
        files: &toml::Table,
    ) -> Result<(), String> {
        if let Some(output) = str_field(files, "output")? {
            settings.output = output.to_string();
        }
        if let Some(output_dir) = str_field(files, "output_dir")? {
            settings.output_dir = output_dir.to_string();
        }
        Ok(())
    }

    fn parse_meshes_section(
        settings: &mut RenderSettings,
        meshes: &toml::Table,
    ) -> Result<(), String> {
        for (name, value) in meshes {
            let path = value
                .as_str()
                .ok_or_else(|| format!("Mesh '{}' must be a path string", name))?;
            settings.meshes.insert(name.clone(), path.to_string());
        }
        Ok(())
    }

    fn parse_render_section(
        settings: &mut RenderSettings,
        render: &toml::Table,
    ) -> Result<(), String> {
        if let Some(width) = usize_field(render, "width")? {
            settings.width = width;
        }
        if let Some(height) = usize_field(render, "height")? {
            settings.height = height;
        }
        if let Some(frames) = usize_field(render, "frames")? {
            settings.frames = frames;
        }
        if let Some(tolerance) = f32_field(render, "barycentric_tolerance")? {
            settings.barycentric_tolerance = tolerance;
        }
        if let Some(use_multithreading) = bool_field(render, "use_multithreading")? {
            settings.use_multithreading = use_multithreading;
        }
        if let Some(depth_lock) = str_field(render, "depth_lock")? {
            match depth_lock {
                "global" | "banded" => settings.depth_lock = depth_lock.to_string(),
                other => warn!(
                    "Unknown depth_lock '{}', using '{}'",
                    other, settings.depth_lock
                ),
            }
        }
        if let Some(rows) = usize_field(render, "depth_lock_rows")? {
            settings.depth_lock_rows = rows;
        }
        if let Some(clear_color) = str_field(render, "clear_color")? {
            settings.clear_color = clear_color.to_string();
        }
        if let Some(save_depth) = bool_field(render, "save_depth")? {
            settings.save_depth = save_depth;
        }
        if let Some(use_gamma) = bool_field(render, "use_gamma")? {
            settings.use_gamma = use_gamma;
        }
        Ok(())
    }

    fn parse_camera_section(
        settings: &mut RenderSettings,
        camera: &toml::Table,
    ) -> Result<(), String> {
        let prefixed = |e: String| format!("camera.{}", e);

        if let Some(position) = str_field(camera, "position").map_err(prefixed)? {
            parse_vec3(position).map_err(|e| format!("camera.position: {}", e))?;
            settings.camera_position = position.to_string();
        }
        if let Some(up) = str_field(camera, "up").map_err(prefixed)? {
            parse_vec3(up).map_err(|e| format!("camera.up: {}", e))?;
            settings.camera_up = up.to_string();
        }
        if let Some(yaw) = f32_field(camera, "yaw").map_err(prefixed)? {
            settings.camera_yaw = yaw;
        }
        if let Some(pitch) = f32_field(camera, "pitch").map_err(prefixed)? {
            settings.camera_pitch = pitch;
        }
        if let Some(distance) = f32_field(camera, "target_distance").map_err(prefixed)? {
            settings.camera_target_distance = distance;
        }
        if let Some(fov) = f32_field(camera, "fov").map_err(prefixed)? {
            settings.camera_fov = fov;
        }
        if let Some(near) = f32_field(camera, "near").map_err(prefixed)? {
            settings.camera_near = near;
        }
        if let Some(far) = f32_field(camera, "far").map_err(prefixed)? {
            settings.camera_far = far;
        }
        Ok(())
    }

    fn parse_bodies_array(toml: &Value) -> Result<Vec<BodyConfig>, String> {
        let bodies = toml
            .get("body")
            .and_then(|v| v.as_array())
            .ok_or_else(|| "'body' must be an array of tables ([[body]])".to_string())?;

        bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                let table = body
                    .as_table()
                    .ok_or_else(|| format!("body #{} is not a table", i))?;
                Self::parse_body(i, table)
            })
            .collect()
    }

    fn parse_body(index: usize, body: &toml::Table) -> Result<BodyConfig, String> {
        let name = str_field(body, "name")
            .map_err(|e| format!("body #{} {}", index, e))?
            .map(str::to_string)
            .unwrap_or_else(|| format!("body{}", index));
        let prefixed = |e: String| format!("body '{}' {}", name, e);

        // Either a kind name or its numeric identifier
        let kind = match body.get("kind") {
            Some(Value::String(kind_name)) => {
                ObjectKind::from_name(kind_name).unwrap_or_else(|| {
                    warn!(
                        "Body '{}' has unknown kind '{}', rendering it unlit",
                        name, kind_name
                    );
                    ObjectKind::Unlit
                })
            }
            Some(Value::Integer(id)) => {
                let kind = i32::try_from(*id).map_or(ObjectKind::Unlit, ObjectKind::from_id);
                if kind == ObjectKind::Unlit {
                    warn!(
                        "Body '{}' has unknown kind id {}, rendering it unlit",
                        name, id
                    );
                }
                kind
            }
            Some(other) => {
                return Err(format!(
                    "body '{}' kind must be a name or an id, got {}",
                    name, other
                ));
            }
            None => ObjectKind::Unlit,
        };

        let mesh = str_field(body, "mesh")
            .map_err(prefixed)?
            .unwrap_or("planet")
            .to_string();

        // Vector keys are "x,y,z" strings, scalar keys are numbers
        let vec3 = |key: &str, default: Vector3<f32>| -> Result<Vector3<f32>, String> {
            match str_field(body, key).map_err(prefixed)? {
                Some(s) => parse_vec3(s).map_err(|e| format!("body '{}' {}: {}", name, key, e)),
                None => Ok(default),
            }
        };
        let scalar = |key: &str, default: f32| -> Result<f32, String> {
            Ok(f32_field(body, key).map_err(prefixed)?.unwrap_or(default))
        };

        let motion_name = str_field(body, "motion")
            .map_err(prefixed)?
            .unwrap_or("fixed");
        let motion = match motion_name {
            "fixed" => BodyMotion::Fixed {
                translation: vec3("translation", Vector3::zeros())?,
                scale: vec3("scale", Vector3::repeat(1.0))?,
            },
            "orbit" => {
                let spin_axis = vec3("spin_axis", Vector3::y())?;
                if spin_axis.norm_squared() < 1e-12 {
                    return Err(format!("body '{}' spin_axis must not be zero", name));
                }
                BodyMotion::Orbit {
                    radius: scalar("orbit_radius", 0.0)?,
                    speed: scalar("orbit_speed", 0.0)?,
                    scale: scalar("scale", 1.0)?,
                    spin_axis,
                    spin_speed: scalar("spin_speed", 0.0)?,
                }
            }
            "follow_camera" => BodyMotion::FollowCamera {
                scale: scalar("scale", 0.05)?,
                ratio: scalar("follow_ratio", 1.0 / 3.0)?,
                drop: scalar("follow_drop", 0.15)?,
            },
            other => {
                return Err(format!("body '{}' has unknown motion '{}'", name, other));
            }
        };

        Ok(BodyConfig {
            name,
            kind,
            mesh,
            motion,
        })
    }

    // ===== RenderSettings -> TOML =====

    fn settings_to_toml(settings: &RenderSettings) -> String {
        let mut content = String::new();

        content.push_str("# Space travel rasterizer configuration\n");
        content.push_str("# Generated from the built-in defaults\n\n");

        content.push_str("[files]\n");
        content.push_str(&format!("output = \"{}\"\n", settings.output));
        content.push_str(&format!("output_dir = \"{}\"\n", settings.output_dir));
        content.push('\n');

        content.push_str("[meshes]\n");
        for (name, path) in &settings.meshes {
            content.push_str(&format!("{} = \"{}\"\n", name, path));
        }
        content.push('\n');

        content.push_str("[render]\n");
        content.push_str(&format!("width = {}\n", settings.width));
        content.push_str(&format!("height = {}\n", settings.height));
        content.push_str(&format!("frames = {}\n", settings.frames));
        content.push_str(&format!(
            "barycentric_tolerance = {}\n",
            float(settings.barycentric_tolerance)
        ));
        content.push_str(&format!(
            "use_multithreading = {}\n",
            settings.use_multithreading
        ));
        content.push_str("# \"global\" or \"banded\"\n");
        content.push_str(&format!("depth_lock = \"{}\"\n", settings.depth_lock));
        content.push_str(&format!("depth_lock_rows = {}\n", settings.depth_lock_rows));
        content.push_str(&format!("clear_color = \"{}\"\n", settings.clear_color));
        content.push_str(&format!("save_depth = {}\n", settings.save_depth));
        content.push_str(&format!("use_gamma = {}\n", settings.use_gamma));
        content.push('\n');

        content.push_str("[camera]\n");
        content.push_str(&format!("position = \"{}\"\n", settings.camera_position));
        content.push_str(&format!("up = \"{}\"\n", settings.camera_up));
        content.push_str(&format!("yaw = {}\n", float(settings.camera_yaw)));
        content.push_str(&format!("pitch = {}\n", float(settings.camera_pitch)));
        content.push_str(&format!(
            "target_distance = {}\n",
            float(settings.camera_target_distance)
        ));
        content.push_str(&format!("fov = {}\n", float(settings.camera_fov)));
        content.push_str(&format!("near = {}\n", float(settings.camera_near)));
        content.push_str(&format!("far = {}\n", float(settings.camera_far)));

        for body in &settings.bodies {
            content.push('\n');
            content.push_str("[[body]]\n");
            content.push_str(&format!("name = \"{}\"\n", body.name));
            content.push_str(&format!("kind = \"{}\"\n", body.kind.name()));
            content.push_str(&format!("mesh = \"{}\"\n", body.mesh));
            content.push_str(&format!("motion = \"{}\"\n", body.motion.name()));
            match &body.motion {
                BodyMotion::Fixed { translation, scale } => {
                    content.push_str(&format!("translation = \"{}\"\n", vec3(translation)));
                    content.push_str(&format!("scale = \"{}\"\n", vec3(scale)));
                }
                BodyMotion::Orbit {
                    radius,
                    speed,
                    scale,
                    spin_axis,
                    spin_speed,
                } => {
                    content.push_str(&format!("orbit_radius = {}\n", float(*radius)));
                    content.push_str(&format!("orbit_speed = {}\n", float(*speed)));
                    content.push_str(&format!("scale = {}\n", float(*scale)));
                    content.push_str(&format!("spin_axis = \"{}\"\n", vec3(spin_axis)));
                    content.push_str(&format!("spin_speed = {}\n", float(*spin_speed)));
                }
                BodyMotion::FollowCamera { scale, ratio, drop } => {
                    content.push_str(&format!("scale = {}\n", float(*scale)));
                    content.push_str(&format!("follow_ratio = {}\n", float(*ratio)));
                    content.push_str(&format!("follow_drop = {}\n", float(*drop)));
                }
            }
        }

        content
    }
}

/// TOML integers and floats both read as f32.
fn as_f32(value: &Value) -> Option<f32> {
    value
        .as_float()
        .map(|f| f as f32)
        .or_else(|| value.as_integer().map(|i| i as f32))
}

// Typed lookups: a missing key is `None`, a key of the wrong type is an error.

fn f32_field(table: &toml::Table, key: &str) -> Result<Option<f32>, String> {
    table
        .get(key)
        .map(|v| as_f32(v).ok_or_else(|| format!("{} must be a number, got {}", key, v)))
        .transpose()
}

fn str_field<'a>(table: &'a toml::Table, key: &str) -> Result<Option<&'a str>, String> {
    table
        .get(key)
        .map(|v| {
            v.as_str()
                .ok_or_else(|| format!("{} must be a string, got {}", key, v))
        })
        .transpose()
}

fn bool_field(table: &toml::Table, key: &str) -> Result<Option<bool>, String> {
    table
        .get(key)
        .map(|v| {
            v.as_bool()
                .ok_or_else(|| format!("{} must be true or false, got {}", key, v))
        })
        .transpose()
}

fn usize_field(table: &toml::Table, key: &str) -> Result<Option<usize>, String> {
    table
        .get(key)
        .map(|v| {
            v.as_integer()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| format!("{} must be a non-negative integer, got {}", key, v))
        })
        .transpose()
}

/// Always carries a decimal point so TOML reads it back as a float.
fn float(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains('e') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

fn vec3(v: &Vector3<f32>) -> String {
    format!("{},{},{}", v.x, v.y, v.z)
}
