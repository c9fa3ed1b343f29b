use log::info;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

mod core;
mod geometry;
mod io;
mod material_system;
mod scene;
mod utils;

use crate::core::frame_buffer::ColorBuffer;
use crate::core::renderer::{FrameStats, Renderer};
use crate::geometry::camera::Camera;
use crate::geometry::transform::TransformFactory;
use crate::geometry::vertex::Vertex;
use crate::io::obj_loader::load_obj_mesh;
use crate::io::render_settings::{RenderSettings, parse_point3, parse_vec3};
use crate::io::simple_cli::SimpleCli;
use crate::scene::solar_system::SolarSystem;
use crate::utils::save_utils::save_frame;

/// Loads every mesh some body uses; any failure aborts startup.
fn load_meshes(settings: &RenderSettings) -> Result<HashMap<String, Arc<[Vertex]>>, String> {
    settings
        .meshes
        .iter()
        .filter(|(name, _)| settings.bodies.iter().any(|body| &body.mesh == *name))
        .map(|(name, path)| -> Result<(String, Arc<[Vertex]>), String> {
            let vertices = load_obj_mesh(path)?;
            info!(
                "Mesh '{}': {} vertices, {} triangles",
                name,
                vertices.len(),
                vertices.len() / 3
            );
            Ok((name.clone(), Arc::from(vertices)))
        })
        .collect()
}

fn build_camera(settings: &RenderSettings) -> Result<Camera, String> {
    Ok(Camera::new(
        parse_point3(&settings.camera_position)?,
        parse_vec3(&settings.camera_up)?,
        settings.camera_yaw,
        settings.camera_pitch,
        settings.camera_target_distance,
        settings.camera_fov,
        settings.aspect_ratio(),
        settings.camera_near,
        settings.camera_far,
    ))
}

fn run(settings: &RenderSettings) -> Result<(), String> {
    let meshes = load_meshes(settings)?;
    let mut system = SolarSystem::new(&settings.bodies, &meshes)?;
    let camera = build_camera(settings)?;

    let renderer = Renderer::new(settings.width, settings.height, settings.depth_locking()?)
        .with_tolerance(settings.barycentric_tolerance)
        .with_multithreading(settings.use_multithreading);
    let color_buffer = ColorBuffer::new(settings.width, settings.height);
    let clear_color = settings.clear_color_rgba()?;
    let viewport = TransformFactory::viewport(settings.width, settings.height);

    fs::create_dir_all(&settings.output_dir).map_err(|e| {
        format!(
            "Failed to create output directory {}: {}",
            settings.output_dir, e
        )
    })?;

    info!(
        "Rendering {} frame(s) of {} bodies at {}x{} ({} depth locking, {} threads)",
        settings.frames,
        system.len(),
        settings.width,
        settings.height,
        settings.depth_lock,
        if settings.use_multithreading {
            rayon::current_num_threads()
        } else {
            1
        }
    );

    let start_time = Instant::now();
    let mut totals = FrameStats::default();

    for frame in 0..settings.frames {
        system.tick();
        let objects = system.render_objects(&camera, &viewport);
        let stats =
            renderer.render_frame(&objects, camera.light_vector(), clear_color, &color_buffer);
        totals = totals + stats;

        save_frame(
            &color_buffer,
            settings.save_depth.then_some(&renderer.depth_buffer),
            &settings.output_dir,
            &settings.output,
            frame,
            settings.use_gamma,
        )?;
    }

    let elapsed = start_time.elapsed();
    info!(
        "Done: {} frame(s), {} fragments committed in {:?} ({:.1} fps)",
        settings.frames,
        totals.fragments_committed,
        elapsed,
        settings.frames as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = SimpleCli::process()?;
    run(&settings)
}
