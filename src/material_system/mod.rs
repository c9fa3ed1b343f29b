// material_system/mod.rs
// Colours, procedural noise and the per-object fragment shaders
pub mod color;
pub mod noise;
pub mod shaders;
