use crate::core::frame_buffer::{DepthBuffer, DepthLocking, PixelSink};
use crate::core::rasterizer::{RasterSettings, rasterize_triangle};
use crate::geometry::interpolation::DEFAULT_BARYCENTRIC_TOLERANCE;
use crate::geometry::transform::vertex_shader;
use crate::geometry::vertex::TransformedVertex;
use crate::material_system::color::Rgba;
use crate::scene::scene_object::RenderObject;
use log::{debug, info};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::ops::Add;
use std::time::{Duration, Instant};

/// Counters for one frame, summed across all rendering tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub objects: usize,
    pub triangles: usize,
    /// Fragments that passed containment, camera-depth and intensity tests
    pub fragments_tested: usize,
    /// Fragments that won the depth comparison
    pub fragments_committed: usize,
    pub elapsed: Duration,
}

impl Add for FrameStats {
    type Output = FrameStats;

    fn add(self, other: FrameStats) -> FrameStats {
        FrameStats {
            objects: self.objects + other.objects,
            triangles: self.triangles + other.triangles,
            fragments_tested: self.fragments_tested + other.fragments_tested,
            fragments_committed: self.fragments_committed + other.fragments_committed,
            elapsed: self.elapsed.max(other.elapsed),
        }
    }
}

/// Frame driver. Owns the depth buffer shared by every object of a frame.
pub struct Renderer {
    pub width: usize,
    pub height: usize,
    pub depth_buffer: DepthBuffer,
    /// Allowed deviation of `u + v + w` from one
    pub tolerance: f32,
    pub use_multithreading: bool,
}

impl Renderer {
    pub fn new(width: usize, height: usize, locking: DepthLocking) -> Self {
        let depth_buffer = DepthBuffer::new(width, height, locking);
        debug!(
            "Depth buffer {}x{}: {:?}, {} lock(s)",
            width,
            height,
            locking,
            depth_buffer.band_count()
        );
        Renderer {
            width,
            height,
            depth_buffer,
            tolerance: DEFAULT_BARYCENTRIC_TOLERANCE,
            use_multithreading: true,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_multithreading(mut self, use_multithreading: bool) -> Self {
        self.use_multithreading = use_multithreading;
        self
    }

    /// Renders one frame into `sink`.
    ///
    /// Resets the depth buffer, clears the sink, then renders every object as
    /// its own task against the shared depth buffer and joins them all before
    /// returning. Which object owns a contested pixel depends only on depth,
    /// never on task order.
    pub fn render_frame<S>(
        &self,
        objects: &[RenderObject],
        light: Vector3<f32>,
        clear_color: Rgba,
        sink: &S,
    ) -> FrameStats
    where
        S: PixelSink + ?Sized,
    {
        let start_time = Instant::now();

        self.depth_buffer.reset();
        sink.clear(clear_color);

        let settings = RasterSettings {
            tolerance: self.tolerance,
            light,
        };

        let stats = if self.use_multithreading {
            objects
                .par_iter()
                .map(|object| self.render_object(object, &settings, sink))
                .reduce(FrameStats::default, |a, b| a + b)
        } else {
            objects
                .iter()
                .map(|object| self.render_object(object, &settings, sink))
                .fold(FrameStats::default(), |a, b| a + b)
        };

        let stats = FrameStats {
            elapsed: start_time.elapsed(),
            ..stats
        };
        info!(
            "Frame: {} objects, {} triangles, {} fragments tested, {} committed in {:?}",
            stats.objects,
            stats.triangles,
            stats.fragments_tested,
            stats.fragments_committed,
            stats.elapsed
        );
        stats
    }

    /// One rendering task: transform, rasterize, resolve, shade.
    fn render_object<S>(
        &self,
        object: &RenderObject,
        settings: &RasterSettings,
        sink: &S,
    ) -> FrameStats
    where
        S: PixelSink + ?Sized,
    {
        let start_time = Instant::now();

        let transformed: Vec<TransformedVertex> = object
            .mesh
            .iter()
            .map(|vertex| vertex_shader(vertex, &object.uniform))
            .collect();

        let kind = object.kind;
        let lighting = kind.lighting();
        let mut stats = FrameStats {
            objects: 1,
            ..FrameStats::default()
        };

        for chunk in transformed.chunks_exact(3) {
            let triangle = [chunk[0], chunk[1], chunk[2]];
            stats.triangles += 1;
            let tested = rasterize_triangle(
                &triangle,
                self.width,
                self.height,
                settings,
                lighting,
                object.base_color,
                |fragment| {
                    if self
                        .depth_buffer
                        .resolve(&fragment, sink, |f| kind.shade(f))
                    {
                        stats.fragments_committed += 1;
                    }
                },
            );
            stats.fragments_tested += tested;
        }

        stats.elapsed = start_time.elapsed();
        debug!(
            "{} ({}): {} triangles, {} fragments, {} committed, {:?}",
            object.name,
            kind.name(),
            stats.triangles,
            stats.fragments_tested,
            stats.fragments_committed,
            stats.elapsed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_buffer::{ColorBuffer, FAR_DEPTH};
    use crate::geometry::transform::Uniform;
    use crate::geometry::vertex::Vertex;
    use crate::material_system::shaders::ObjectKind;
    use nalgebra::{Matrix4, Point3};
    use std::sync::Arc;

    const SIZE: usize = 48;

    /// Identity transforms except for a viewport that flips z, so a vertex at
    /// `(x, y, -d)` lands on screen at `(x, y)` with depth `d` and camera
    /// depth `d`.
    fn screen_uniform() -> Uniform {
        Uniform {
            viewport: Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 1.0, -1.0)),
            ..Uniform::default()
        }
    }

    fn triangle_object(
        name: &str,
        corners: [(f32, f32); 3],
        depth: f32,
        color: Rgba,
    ) -> RenderObject {
        let mesh: Vec<Vertex> = corners
            .iter()
            .map(|&(x, y)| Vertex::new(Point3::new(x, y, -depth), Vector3::z()))
            .collect();
        RenderObject::new(name, Arc::from(mesh), screen_uniform(), ObjectKind::Unlit)
            .with_base_color(color)
    }

    fn overlapping_pair() -> Vec<RenderObject> {
        vec![
            triangle_object(
                "near",
                [(5.0, 5.0), (40.0, 5.0), (5.0, 40.0)],
                0.3,
                Rgba::rgb(0, 0, 255),
            ),
            triangle_object(
                "far",
                [(8.0, 8.0), (44.0, 8.0), (8.0, 44.0)],
                0.7,
                Rgba::rgb(255, 0, 0),
            ),
        ]
    }

    fn render(
        renderer: &Renderer,
        objects: &[RenderObject],
    ) -> (Vec<u8>, Vec<f32>, FrameStats) {
        let sink = ColorBuffer::new(renderer.width, renderer.height);
        let stats = renderer.render_frame(objects, Vector3::z(), Rgba::BLACK, &sink);
        (
            sink.to_rgba_bytes(),
            renderer.depth_buffer.to_top_down_vec(),
            stats,
        )
    }

    fn assert_depth(renderer: &Renderer, x: usize, y: usize, expected: f32) {
        let depth = renderer.depth_buffer.get(x, y).unwrap();
        assert!(
            (depth - expected).abs() < 1e-5,
            "depth at ({}, {}) is {}, expected {}",
            x,
            y,
            depth,
            expected
        );
    }

    #[test]
    fn test_nearer_triangle_wins_overlap() {
        let renderer =
            Renderer::new(SIZE, SIZE, DepthLocking::Global).with_multithreading(false);
        let sink = ColorBuffer::new(SIZE, SIZE);
        let stats = renderer.render_frame(&overlapping_pair(), Vector3::z(), Rgba::BLACK, &sink);

        // Pixel (12, 12) bottom-up is covered by both triangles
        assert_depth(&renderer, 12, 12, 0.3);
        assert_eq!(sink.get(12, SIZE - 1 - 12), Some(Rgba::rgb(0, 0, 255)));

        // Only the far triangle reaches (38, 12)
        assert_depth(&renderer, 38, 12, 0.7);
        assert_eq!(sink.get(38, SIZE - 1 - 12), Some(Rgba::rgb(255, 0, 0)));

        // Untouched corner keeps the clear colour and the far sentinel
        assert_eq!(renderer.depth_buffer.get(46, 46), Some(FAR_DEPTH));
        assert_eq!(sink.get(46, 1), Some(Rgba::BLACK));

        assert_eq!(stats.objects, 2);
        assert_eq!(stats.triangles, 2);
        assert!(stats.fragments_committed <= stats.fragments_tested);
    }

    #[test]
    fn test_result_is_independent_of_object_order() {
        let forward = overlapping_pair();
        let mut reversed = overlapping_pair();
        reversed.reverse();

        let sequential =
            Renderer::new(SIZE, SIZE, DepthLocking::Global).with_multithreading(false);
        let (colors, depths, _) = render(&sequential, &forward);
        let (reversed_colors, reversed_depths, _) = render(&sequential, &reversed);
        assert_eq!(colors, reversed_colors);
        assert_eq!(depths, reversed_depths);

        for locking in [DepthLocking::Global, DepthLocking::Banded { rows: 5 }] {
            let parallel = Renderer::new(SIZE, SIZE, locking);
            for _ in 0..8 {
                let (c, d, _) = render(&parallel, &forward);
                assert_eq!(c, colors);
                assert_eq!(d, depths);
                let (c, d, _) = render(&parallel, &reversed);
                assert_eq!(c, colors);
                assert_eq!(d, depths);
            }
        }
    }

    #[test]
    fn test_many_concurrent_objects_leave_minimum_depth() {
        let objects: Vec<RenderObject> = (0..16)
            .map(|i| {
                let depth = 0.2 + ((i * 7) % 16) as f32 * 0.04;
                triangle_object(
                    &format!("layer {}", i),
                    [(2.0, 2.0), (46.0, 2.0), (2.0, 46.0)],
                    depth,
                    Rgba::rgb(i as u8 * 10, 0, 0),
                )
            })
            .collect();

        // i = 0 is the nearest layer
        let renderer = Renderer::new(SIZE, SIZE, DepthLocking::Banded { rows: 3 });
        let sink = ColorBuffer::new(SIZE, SIZE);
        renderer.render_frame(&objects, Vector3::z(), Rgba::WHITE, &sink);

        for (x, y) in [(3, 3), (10, 20), (20, 10), (2, 40)] {
            assert_depth(&renderer, x, y, 0.2);
            assert_eq!(sink.get(x, SIZE - 1 - y), Some(Rgba::rgb(0, 0, 0)));
        }
    }

    #[test]
    fn test_geometry_behind_camera_commits_nothing() {
        let behind = triangle_object(
            "behind",
            [(5.0, 5.0), (40.0, 5.0), (5.0, 40.0)],
            -0.5,
            Rgba::WHITE,
        );
        let renderer = Renderer::new(SIZE, SIZE, DepthLocking::Global);
        let (colors, depths, stats) = render(&renderer, &[behind]);

        assert_eq!(stats.fragments_tested, 0);
        assert_eq!(stats.fragments_committed, 0);
        assert!(depths.iter().all(|d| *d == FAR_DEPTH));
        assert!(colors.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_space_back_faces_are_dropped() {
        let mut inward = triangle_object(
            "sky",
            [(5.0, 5.0), (40.0, 5.0), (5.0, 40.0)],
            0.5,
            Rgba::WHITE,
        );
        inward.kind = ObjectKind::Space;
        let mesh: Vec<Vertex> = inward
            .mesh
            .iter()
            .map(|v| Vertex::new(v.position, -Vector3::z()))
            .collect();
        inward.mesh = Arc::from(mesh);

        let renderer = Renderer::new(SIZE, SIZE, DepthLocking::Global);
        let (_, depths, stats) = render(&renderer, &[inward]);
        assert_eq!(stats.fragments_committed, 0);
        assert!(depths.iter().all(|d| *d == FAR_DEPTH));
    }

    #[test]
    fn test_frame_resets_previous_state() {
        let renderer = Renderer::new(SIZE, SIZE, DepthLocking::Global);
        render(&renderer, &overlapping_pair());
        let (colors, depths, stats) = render(&renderer, &[]);

        assert_eq!(stats.objects, 0);
        assert_eq!(stats.fragments_committed, 0);
        assert!(depths.iter().all(|d| *d == FAR_DEPTH));
        assert!(colors.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_leftover_vertices_are_ignored() {
        let mut object = triangle_object(
            "ragged",
            [(5.0, 5.0), (40.0, 5.0), (5.0, 40.0)],
            0.5,
            Rgba::WHITE,
        );
        let mut mesh = object.mesh.to_vec();
        mesh.push(Vertex::new(Point3::new(1.0, 1.0, -0.5), Vector3::z()));
        object.mesh = Arc::from(mesh);

        let renderer = Renderer::new(SIZE, SIZE, DepthLocking::Global);
        let (_, _, stats) = render(&renderer, &[object]);
        assert_eq!(stats.triangles, 1);
        assert!(stats.fragments_committed > 0);
    }
}
