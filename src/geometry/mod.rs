// geometry/mod.rs
// Vertex records, coordinate transforms, barycentric math and the camera
pub mod camera;
pub mod interpolation;
pub mod transform;
pub mod vertex;
