use nalgebra::{Point2, Point3, Vector3};

/// Below this absolute value the signed-area denominator is treated as zero
/// and the triangle as having no interior.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Containment tolerance used by the original pipeline (`|1 - (u+v+w)| < 0.005`).
pub const DEFAULT_BARYCENTRIC_TOLERANCE: f32 = 0.005;

/// Calculates barycentric coordinates (u, v, w) of point `p` with respect to
/// the 2D triangle (a, b, c) using the signed-area ratio formula.
/// `u` weights `a`, `v` weights `b`, `w` weights `c`.
///
/// Returns `None` for zero-area (or NaN) triangles instead of dividing.
pub fn barycentric_coordinates(
    p: Point2<f32>,
    a: Point2<f32>,
    b: Point2<f32>,
    c: Point2<f32>,
) -> Option<Vector3<f32>> {
    let denominator = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);

    // Written negated so NaN also takes the early return
    if !(denominator.abs() >= DEGENERATE_EPSILON) {
        return None;
    }

    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / denominator;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / denominator;
    let w = 1.0 - u - v;

    Some(Vector3::new(u, v, w))
}

/// A point is inside when every coordinate lies in `[0, 1]` and the three sum
/// to one within `tolerance`.
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>, tolerance: f32) -> bool {
    (0.0..=1.0).contains(&bary.x)
        && (0.0..=1.0).contains(&bary.y)
        && (0.0..=1.0).contains(&bary.z)
        && (1.0 - (bary.x + bary.y + bary.z)).abs() < tolerance
}

/// Linear (screen-space) interpolation of a scalar attribute.
#[inline]
pub fn interpolate_scalar(bary: Vector3<f32>, a: f32, b: f32, c: f32) -> f32 {
    bary.x * a + bary.y * b + bary.z * c
}

/// Linear (screen-space) interpolation of a vector attribute.
#[inline]
pub fn interpolate_vector(
    bary: Vector3<f32>,
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
) -> Vector3<f32> {
    a * bary.x + b * bary.y + c * bary.z
}

/// Linear (screen-space) interpolation of a point attribute.
#[inline]
pub fn interpolate_point(
    bary: Vector3<f32>,
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
) -> Point3<f32> {
    Point3::from(interpolate_vector(bary, &a.coords, &b.coords, &c.coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_barycentric_at_vertices() {
        let a = Point2::new(10.0, 10.0);
        let b = Point2::new(20.0, 10.0);
        let c = Point2::new(10.0, 20.0);

        let at_a = barycentric_coordinates(a, a, b, c).unwrap();
        let at_b = barycentric_coordinates(b, a, b, c).unwrap();
        let at_c = barycentric_coordinates(c, a, b, c).unwrap();

        assert!(approx(at_a.x, 1.0) && approx(at_a.y, 0.0) && approx(at_a.z, 0.0));
        assert!(approx(at_b.x, 0.0) && approx(at_b.y, 1.0) && approx(at_b.z, 0.0));
        assert!(approx(at_c.x, 0.0) && approx(at_c.y, 0.0) && approx(at_c.z, 1.0));
    }

    #[test]
    fn test_barycentric_inside_and_outside() {
        let a = Point2::new(10.0, 10.0);
        let b = Point2::new(20.0, 10.0);
        let c = Point2::new(10.0, 20.0);

        let inside = barycentric_coordinates(Point2::new(12.5, 12.5), a, b, c).unwrap();
        assert!(is_inside_triangle(inside, DEFAULT_BARYCENTRIC_TOLERANCE));

        let outside = barycentric_coordinates(Point2::new(19.5, 19.5), a, b, c).unwrap();
        assert!(!is_inside_triangle(outside, DEFAULT_BARYCENTRIC_TOLERANCE));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let a = Point2::new(10.0, 10.0);
        let b = Point2::new(20.0, 10.0);
        let c = Point2::new(10.0, 20.0);
        let p = Point2::new(12.5, 13.5);

        let ccw = barycentric_coordinates(p, a, b, c).unwrap();
        let cw = barycentric_coordinates(p, a, c, b).unwrap();
        assert!(is_inside_triangle(ccw, DEFAULT_BARYCENTRIC_TOLERANCE));
        assert!(is_inside_triangle(cw, DEFAULT_BARYCENTRIC_TOLERANCE));
        assert!(approx(ccw.y, cw.z) && approx(ccw.z, cw.y));
    }

    #[test]
    fn test_degenerate_triangles_have_no_coordinates() {
        let p = Point2::new(5.0, 5.0);
        let same = Point2::new(5.0, 5.0);
        assert!(barycentric_coordinates(p, same, same, same).is_none());

        // Collinear
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(5.0, 5.0);
        let c = Point2::new(10.0, 10.0);
        assert!(barycentric_coordinates(p, a, b, c).is_none());

        let nan = Point2::new(f32::NAN, 1.0);
        assert!(barycentric_coordinates(p, nan, b, c).is_none());
    }

    #[test]
    fn test_tolerance_rejects_bad_sum() {
        let off = Vector3::new(0.5, 0.3, 0.21);
        assert!(!is_inside_triangle(off, 1e-5));
        assert!(is_inside_triangle(off, 0.02));
        assert!(!is_inside_triangle(Vector3::new(-0.01, 0.5, 0.51), 0.1));
    }

    #[test]
    fn test_interpolation_is_convex_combination() {
        let weights = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.2, 0.3, 0.5),
            Vector3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0),
            Vector3::new(0.0, 0.75, 0.25),
        ];
        let a = Vector3::new(1.0, -2.0, 0.5);
        let b = Vector3::new(0.0, 4.0, 3.0);
        let c = Vector3::new(-1.0, 1.0, 9.0);

        for bary in weights {
            let v = interpolate_vector(bary, &a, &b, &c);
            let expected = a * bary.x + b * bary.y + c * bary.z;
            assert!((v - expected).norm() < 1e-6);

            let s = interpolate_scalar(bary, 0.3, 0.7, 0.1);
            assert!(approx(s, 0.3 * bary.x + 0.7 * bary.y + 0.1 * bary.z));

            let p = interpolate_point(bary, &Point3::from(a), &Point3::from(b), &Point3::from(c));
            assert!((p.coords - expected).norm() < 1e-6);
        }
    }
}
