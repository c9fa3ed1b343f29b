//! Hashed value noise over 3D points for procedural surface colouring.
//!
//! Deterministic and stateless so every rendering task can call it freely.

use nalgebra::Point3;

/// Pseudo-random value in [0, 1] from a single float seed.
#[inline]
pub fn hash(n: f32) -> f32 {
    let n = (n * 12.9898).sin() * 43758.547;
    n - n.floor()
}

/// Hash of an integer lattice cell.
#[inline]
fn lattice(ix: i32, iy: i32, iz: i32) -> f32 {
    hash(ix as f32 + iy as f32 * 57.0 + iz as f32 * 113.0)
}

/// Smoothly interpolated lattice noise in [0, 1].
pub fn value_noise(p: &Point3<f32>) -> f32 {
    let cell = p.map(f32::floor);
    let (ix, iy, iz) = (cell.x as i32, cell.y as i32, cell.z as i32);

    let f = *p - cell;
    // Smoothstep weights
    let u = f.x * f.x * (3.0 - 2.0 * f.x);
    let v = f.y * f.y * (3.0 - 2.0 * f.y);
    let w = f.z * f.z * (3.0 - 2.0 * f.z);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let x00 = lerp(lattice(ix, iy, iz), lattice(ix + 1, iy, iz), u);
    let x10 = lerp(lattice(ix, iy + 1, iz), lattice(ix + 1, iy + 1, iz), u);
    let x01 = lerp(lattice(ix, iy, iz + 1), lattice(ix + 1, iy, iz + 1), u);
    let x11 = lerp(lattice(ix, iy + 1, iz + 1), lattice(ix + 1, iy + 1, iz + 1), u);

    let y0 = lerp(x00, x10, v);
    let y1 = lerp(x01, x11, v);

    lerp(y0, y1, w)
}

/// Fractal sum of `octaves` noise layers, normalized back to [0, 1].
pub fn fractal_noise(p: &Point3<f32>, octaves: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut total = 0.0;

    for _ in 0..octaves {
        value += value_noise(&(*p * frequency)) * amplitude;
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    if total > 0.0 { value / total } else { 0.0 }
}
