use crate::geometry::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Camera driving the view and projection matrices of every body.
///
/// Orientation is stored as yaw/pitch in degrees; the target sits
/// `target_distance` units ahead of the eye along that orientation.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position
    pub position: Point3<f32>,
    /// Look-at point, derived from position and yaw/pitch
    pub target: Point3<f32>,
    /// World up direction
    pub up: Vector3<f32>,
    /// Rotation about the up axis, degrees
    pub yaw: f32,
    /// Elevation, degrees
    pub pitch: f32,
    pub target_distance: f32,
    /// Vertical field of view, radians
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Point3<f32>,
        up: Vector3<f32>,
        yaw: f32,
        pitch: f32,
        target_distance: f32,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut camera = Camera {
            position,
            target: position,
            up: up.normalize(),
            yaw,
            pitch,
            target_distance,
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
        };
        camera.update_matrices();
        camera
    }

    /// Unit viewing direction for yaw/pitch in degrees; yaw 0, pitch 0 looks down -z.
    pub fn direction(yaw_deg: f32, pitch_deg: f32) -> Vector3<f32> {
        let yaw = yaw_deg.to_radians();
        let pitch = pitch_deg.to_radians();
        Vector3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
    }

    /// Recomputes the target from yaw/pitch, then both matrices.
    pub fn update_matrices(&mut self) {
        let direction = Camera::direction(self.yaw, self.pitch);
        self.target = self.position + direction * self.target_distance;

        self.view_matrix = TransformFactory::view(&self.position, &self.target, &self.up);
        self.projection_matrix =
            TransformFactory::perspective(self.aspect_ratio, self.fov_y, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    /// Light vector for the frame: from the target back toward the eye.
    /// Deliberately left unnormalized.
    pub fn light_vector(&self) -> Vector3<f32> {
        self.position - self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(yaw: f32, pitch: f32) -> Camera {
        Camera::new(
            Point3::new(0.0, 0.0, 17.0),
            Vector3::y(),
            yaw,
            pitch,
            5.0,
            45.0,
            1.5,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_default_orientation_looks_down_negative_z() {
        let cam = camera(0.0, 0.0);
        assert!((cam.target - Point3::new(0.0, 0.0, 12.0)).norm() < 1e-5);
        assert!((cam.light_vector() - Vector3::new(0.0, 0.0, 5.0)).norm() < 1e-5);
    }

    #[test]
    fn test_yaw_turns_right() {
        let cam = camera(90.0, 0.0);
        assert!((cam.target - Point3::new(5.0, 0.0, 17.0)).norm() < 1e-4);
    }
}
