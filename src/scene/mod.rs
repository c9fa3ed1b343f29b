pub mod scene_object;
pub mod solar_system;
