//! Triangle to fragment conversion.
//!
//! Bounding-box scan with a barycentric containment test at pixel centres.
//! Attributes are interpolated linearly in screen space.

use crate::core::fragment::Fragment;
use crate::geometry::interpolation::{
    DEFAULT_BARYCENTRIC_TOLERANCE, barycentric_coordinates, interpolate_point, interpolate_scalar,
    interpolate_vector, is_inside_triangle,
};
use crate::geometry::vertex::TransformedVertex;
use crate::material_system::color::Rgba;
use crate::material_system::shaders::LightingModel;
use nalgebra::{Point2, Vector3};

/// Per-frame inputs shared by every triangle of every object.
#[derive(Debug, Clone, Copy)]
pub struct RasterSettings {
    /// Allowed deviation of `u + v + w` from one
    pub tolerance: f32,
    /// Light vector for the frame
    pub light: Vector3<f32>,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_BARYCENTRIC_TOLERANCE,
            light: Vector3::z(),
        }
    }
}

/// Inclusive pixel range covered by a triangle, already limited to
/// `[1, width-2] x [1, height-2]`. The outermost row and column are never
/// scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl BoundingBox {
    pub fn from_triangle(
        triangle: &[TransformedVertex; 3],
        width: usize,
        height: usize,
    ) -> Option<Self> {
        if width < 3 || height < 3 {
            return None;
        }

        let [a, b, c] = triangle.map(|v| v.position);
        // Float-to-int casts saturate and map NaN to 0, the clamps do the rest
        let min_x = (a.x.min(b.x).min(c.x).floor() as i64).max(1);
        let min_y = (a.y.min(b.y).min(c.y).floor() as i64).max(1);
        let max_x = (a.x.max(b.x).max(c.x).floor() as i64).min(width as i64 - 2);
        let max_y = (a.y.max(b.y).max(c.y).floor() as i64).min(height as i64 - 2);

        if max_x < min_x || max_y < min_y {
            None
        } else {
            Some(Self {
                min_x: min_x as usize,
                min_y: min_y as usize,
                max_x: max_x as usize,
                max_y: max_y as usize,
            })
        }
    }

    pub fn for_each_pixel<F>(&self, mut callback: F)
    where
        F: FnMut(usize, usize),
    {
        for y in self.min_y..=self.max_y {
            for x in self.min_x..=self.max_x {
                callback(x, y);
            }
        }
    }
}

/// Rasterizes one screen-space triangle and hands every surviving fragment to
/// `emit`.
///
/// A pixel survives when its centre is inside the triangle, the interpolated
/// camera-space depth is positive, and `lighting` yields a positive
/// intensity. The fragment colour is `base_color` scaled by that intensity.
/// Returns the number of fragments emitted.
pub fn rasterize_triangle<F>(
    triangle: &[TransformedVertex; 3],
    width: usize,
    height: usize,
    settings: &RasterSettings,
    lighting: LightingModel,
    base_color: Rgba,
    mut emit: F,
) -> usize
where
    F: FnMut(Fragment),
{
    let bbox = match BoundingBox::from_triangle(triangle, width, height) {
        Some(bbox) => bbox,
        None => return 0,
    };

    let [a, b, c] = triangle;
    let pa = Point2::new(a.position.x, a.position.y);
    let pb = Point2::new(b.position.x, b.position.y);
    let pc = Point2::new(c.position.x, c.position.y);

    let mut emitted = 0;
    bbox.for_each_pixel(|x, y| {
        let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

        let bary = match barycentric_coordinates(pixel_center, pa, pb, pc) {
            Some(bary) => bary,
            None => return,
        };
        if !is_inside_triangle(bary, settings.tolerance) {
            return;
        }

        // Geometry behind the eye
        let camera_depth = interpolate_scalar(bary, a.z, b.z, c.z);
        if !(camera_depth > 0.0) {
            return;
        }

        let normal = interpolate_vector(bary, &a.normal, &b.normal, &c.normal);
        let intensity = lighting.intensity(&normal, &settings.light);
        if !(intensity > 0.0) {
            return;
        }

        let depth = interpolate_scalar(bary, a.position.z, b.position.z, c.position.z);
        let color = Rgba::interpolate(bary, base_color, base_color, base_color) * intensity;

        emit(Fragment {
            x,
            y,
            color,
            depth,
            original: interpolate_point(bary, &a.original, &b.original, &c.original),
            normal,
            intensity,
        });
        emitted += 1;
    });

    emitted
}
