use crate::core::fragment::Fragment;
use crate::material_system::color::Rgba;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Depth value of a pixel no fragment has reached yet this frame.
pub const FAR_DEPTH: f32 = f32::INFINITY;

/// Destination for finished fragment colours.
///
/// Coordinates are top-down: the depth buffer flips its bottom-up rows
/// exactly once before calling `commit`. Commits happen from several
/// rendering tasks at once, so implementations take `&self`.
pub trait PixelSink: Sync {
    fn clear(&self, color: Rgba);
    fn commit(&self, x: usize, y: usize, color: Rgba);
}

/// How the depth buffer partitions its mutual-exclusion domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLocking {
    /// A single lock around every compare-shade-commit-write unit
    #[default]
    Global,
    /// One lock per horizontal band of `rows` rows
    Banded { rows: usize },
}

/// Shared per-pixel nearest-depth buffer and arbiter of fragment visibility.
///
/// Rows are stored bottom-up, matching the rasterizer. Each band of rows sits
/// behind its own mutex; with `DepthLocking::Global` there is exactly one band.
pub struct DepthBuffer {
    pub width: usize,
    pub height: usize,
    rows_per_band: usize,
    bands: Vec<Mutex<Vec<f32>>>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize, locking: DepthLocking) -> Self {
        let rows_per_band = match locking {
            DepthLocking::Global => height.max(1),
            DepthLocking::Banded { rows } => rows.clamp(1, height.max(1)),
        };

        let bands = (0..height.max(1))
            .step_by(rows_per_band)
            .map(|first_row| {
                let rows = rows_per_band.min(height.saturating_sub(first_row));
                Mutex::new(vec![FAR_DEPTH; rows * width])
            })
            .collect();

        DepthBuffer {
            width,
            height,
            rows_per_band,
            bands,
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn lock_band(&self, band: usize) -> MutexGuard<'_, Vec<f32>> {
        // A panicking task cannot leave a half-written depth value behind
        self.bands[band]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Resets every pixel to `FAR_DEPTH`. Called between frames.
    pub fn reset(&self) {
        self.bands.par_iter().for_each(|band| {
            band.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fill(FAR_DEPTH);
        });
    }

    /// Commits `fragment` if it is strictly nearer than what the buffer holds.
    ///
    /// Comparison, shading, the sink commit and the depth write all happen
    /// while the pixel's band is locked, so two tasks racing on one pixel can
    /// never both win. Ties keep the current occupant. `shade` runs only for
    /// winners. Returns whether the fragment was committed.
    pub fn resolve<S, F>(&self, fragment: &Fragment, sink: &S, shade: F) -> bool
    where
        S: PixelSink + ?Sized,
        F: FnOnce(&Fragment) -> Rgba,
    {
        let (x, y) = (fragment.x, fragment.y);
        if x >= self.width || y >= self.height {
            return false;
        }

        let band = y / self.rows_per_band;
        let index = (y % self.rows_per_band) * self.width + x;

        let mut depths = self.lock_band(band);
        if fragment.depth < depths[index] {
            let color = shade(fragment);
            sink.commit(x, self.height - 1 - y, color);
            depths[index] = fragment.depth;
            true
        } else {
            false
        }
    }

    /// Depth at a bottom-up pixel coordinate.
    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y % self.rows_per_band) * self.width + x;
        Some(self.lock_band(y / self.rows_per_band)[index])
    }

    /// Copies the buffer out in top-down row order, the same order the sink uses.
    pub fn to_top_down_vec(&self) -> Vec<f32> {
        let mut bottom_up = Vec::with_capacity(self.width * self.height);
        for band in 0..self.bands.len() {
            bottom_up.extend_from_slice(&self.lock_band(band));
        }

        let width = self.width.max(1);
        bottom_up
            .chunks(width)
            .rev()
            .flatten()
            .copied()
            .collect()
    }
}

/// RGBA colour buffer, top-down rows. The in-memory pixel sink the frame
/// loop saves to disk.
pub struct ColorBuffer {
    pub width: usize,
    pub height: usize,
    channels: Vec<AtomicU8>,
}

impl ColorBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let channels = (0..width * height * 4).map(|_| AtomicU8::new(0)).collect();
        ColorBuffer {
            width,
            height,
            channels,
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = (y * self.width + x) * 4;
        Some(Rgba::new(
            self.channels[base].load(Ordering::Relaxed),
            self.channels[base + 1].load(Ordering::Relaxed),
            self.channels[base + 2].load(Ordering::Relaxed),
            self.channels[base + 3].load(Ordering::Relaxed),
        ))
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.channels
            .iter()
            .map(|channel| channel.load(Ordering::Relaxed))
            .collect()
    }
}

impl PixelSink for ColorBuffer {
    fn clear(&self, color: Rgba) {
        self.channels.par_chunks(4).for_each(|pixel| {
            pixel[0].store(color.r, Ordering::Relaxed);
            pixel[1].store(color.g, Ordering::Relaxed);
            pixel[2].store(color.b, Ordering::Relaxed);
            pixel[3].store(color.a, Ordering::Relaxed);
        });
    }

    fn commit(&self, x: usize, y: usize, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let base = (y * self.width + x) * 4;
        self.channels[base].store(color.r, Ordering::Relaxed);
        self.channels[base + 1].store(color.g, Ordering::Relaxed);
        self.channels[base + 2].store(color.b, Ordering::Relaxed);
        self.channels[base + 3].store(color.a, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn fragment(x: usize, y: usize, depth: f32, color: Rgba) -> Fragment {
        Fragment {
            x,
            y,
            color,
            depth,
            original: Point3::origin(),
            normal: Vector3::z(),
            intensity: 1.0,
        }
    }

    fn keep(fragment: &Fragment) -> Rgba {
        fragment.color
    }

    #[test]
    fn test_band_layout() {
        assert_eq!(DepthBuffer::new(8, 10, DepthLocking::Global).band_count(), 1);
        assert_eq!(
            DepthBuffer::new(8, 10, DepthLocking::Banded { rows: 4 }).band_count(),
            3
        );
        assert_eq!(
            DepthBuffer::new(8, 10, DepthLocking::Banded { rows: 0 }).band_count(),
            10
        );
    }

    #[test]
    fn test_nearer_fragment_wins_and_ties_keep_occupant() {
        let depth = DepthBuffer::new(16, 16, DepthLocking::Global);
        let sink = ColorBuffer::new(16, 16);
        let red = Rgba::rgb(255, 0, 0);
        let blue = Rgba::rgb(0, 0, 255);

        assert!(depth.resolve(&fragment(3, 4, 0.7, red), &sink, keep));
        assert!(depth.resolve(&fragment(3, 4, 0.3, blue), &sink, keep));
        assert!(!depth.resolve(&fragment(3, 4, 0.5, red), &sink, keep));
        assert!(!depth.resolve(&fragment(3, 4, 0.3, red), &sink, keep));

        assert_eq!(depth.get(3, 4), Some(0.3));
        // Bottom-up row 4 lands on top-down row 11
        assert_eq!(sink.get(3, 11), Some(blue));
        assert_eq!(sink.get(3, 4), Some(Rgba::new(0, 0, 0, 0)));
    }

    #[test]
    fn test_losers_are_never_shaded() {
        let depth = DepthBuffer::new(4, 4, DepthLocking::Global);
        let sink = ColorBuffer::new(4, 4);
        depth.resolve(&fragment(1, 1, 0.2, Rgba::WHITE), &sink, keep);

        let shaded = depth.resolve(&fragment(1, 1, 0.9, Rgba::WHITE), &sink, |_| {
            panic!("shader invoked for an occluded fragment")
        });
        assert!(!shaded);
    }

    #[test]
    fn test_reset_restores_far_depth() {
        let depth = DepthBuffer::new(4, 4, DepthLocking::Banded { rows: 1 });
        let sink = ColorBuffer::new(4, 4);
        depth.resolve(&fragment(2, 2, 0.4, Rgba::WHITE), &sink, keep);
        depth.reset();
        assert!(depth.to_top_down_vec().iter().all(|d| *d == FAR_DEPTH));
    }

    #[test]
    fn test_out_of_range_fragments_are_ignored() {
        let depth = DepthBuffer::new(4, 4, DepthLocking::Global);
        let sink = ColorBuffer::new(4, 4);
        assert!(!depth.resolve(&fragment(4, 0, 0.1, Rgba::WHITE), &sink, keep));
        assert!(!depth.resolve(&fragment(0, 9, 0.1, Rgba::WHITE), &sink, keep));
    }

    #[test]
    fn test_concurrent_writers_leave_minimum() {
        for locking in [DepthLocking::Global, DepthLocking::Banded { rows: 2 }] {
            let depth = DepthBuffer::new(8, 8, locking);
            let sink = ColorBuffer::new(8, 8);

            (0..64u8).into_par_iter().for_each(|i| {
                let d = 0.1 + ((i as f32 * 37.0) % 64.0) / 100.0;
                let shade = Rgba::rgb(i, i, i);
                for y in 0..8 {
                    for x in 0..8 {
                        depth.resolve(&fragment(x, y, d, shade), &sink, keep);
                    }
                }
            });

            // i = 0 has the smallest depth, 0.1
            for y in 0..8 {
                for x in 0..8 {
                    assert_eq!(depth.get(x, y), Some(0.1));
                    assert_eq!(sink.get(x, y), Some(Rgba::rgb(0, 0, 0)));
                }
            }
        }
    }

    #[test]
    fn test_top_down_copy_flips_rows() {
        let depth = DepthBuffer::new(2, 3, DepthLocking::Banded { rows: 2 });
        let sink = ColorBuffer::new(2, 3);
        depth.resolve(&fragment(1, 0, 0.25, Rgba::WHITE), &sink, keep);
        let top_down = depth.to_top_down_vec();
        assert_eq!(top_down.len(), 6);
        assert_eq!(top_down[5], 0.25);
        assert_eq!(top_down[1], FAR_DEPTH);
    }
}
