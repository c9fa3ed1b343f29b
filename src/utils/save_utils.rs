use crate::core::frame_buffer::{ColorBuffer, DepthBuffer};
use crate::material_system::color::apply_colormap_jet;
use image::ColorType;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Writes raw 8-bit pixel data to an image file; the format follows the
/// extension.
pub fn save_image(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
) -> Result<(), String> {
    image::save_buffer(path, data, width, height, color_type)
        .map_err(|e| format!("Failed to save image {}: {}", path.display(), e))?;
    debug!("Saved {}", path.display());
    Ok(())
}

/// Normalizes depth values into [0, 1] over the given percentile range of the
/// finite values. Pixels never written (infinite depth) stay non-finite.
pub fn normalize_depth(depth_buffer: &[f32], min_percentile: f32, max_percentile: f32) -> Vec<f32> {
    let mut finite_depths: Vec<f32> = depth_buffer
        .iter()
        .filter(|d| d.is_finite())
        .copied()
        .collect();

    if finite_depths.is_empty() {
        return vec![f32::NAN; depth_buffer.len()];
    }

    finite_depths.sort_unstable_by(f32::total_cmp);
    let last = finite_depths.len() - 1;
    let index = |percentile: f32| {
        ((percentile / 100.0 * last as f32).round() as usize).min(last)
    };

    let mut min_clip = finite_depths[index(min_percentile)];
    let mut max_clip = finite_depths[index(max_percentile)];
    if max_clip - min_clip < 1e-6 {
        min_clip = finite_depths[0];
        max_clip = finite_depths[last];
    }

    let range = max_clip - min_clip;
    let inv_range = if range > 1e-6 { 1.0 / range } else { 0.0 };
    debug!("Depth normalized over [{:.4}, {:.4}]", min_clip, max_clip);

    depth_buffer
        .iter()
        .map(|&depth| {
            if depth.is_finite() {
                ((depth.clamp(min_clip, max_clip) - min_clip) * inv_range).clamp(0.0, 1.0)
            } else {
                f32::NAN
            }
        })
        .collect()
}

/// `<output_dir>/<output>_<frame>.png`, frame number zero-padded.
pub fn frame_path(output_dir: &str, output: &str, frame: usize, suffix: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{}_{:04}{}.png", output, frame, suffix))
}

/// Saves a finished frame and, if requested, its JET-coloured depth map
/// (near is red, far is blue, empty pixels black).
pub fn save_frame(
    color: &ColorBuffer,
    depth: Option<&DepthBuffer>,
    output_dir: &str,
    output: &str,
    frame: usize,
    use_gamma: bool,
) -> Result<(), String> {
    let width = color.width as u32;
    let height = color.height as u32;

    let color_path = frame_path(output_dir, output, frame, "");
    save_image(
        &color_path,
        &color.to_rgba_bytes(),
        width,
        height,
        ColorType::Rgba8,
    )?;

    if let Some(depth) = depth {
        let normalized: Vec<f32> = normalize_depth(&depth.to_top_down_vec(), 1.0, 99.0)
            .into_iter()
            .map(|d| 1.0 - d)
            .collect();
        let depth_colored = apply_colormap_jet(&normalized, use_gamma);

        let depth_path = frame_path(output_dir, output, frame, "_depth");
        save_image(
            &depth_path,
            &depth_colored,
            depth.width as u32,
            depth.height as u32,
            ColorType::Rgb8,
        )?;
    }

    info!("Frame {} saved to {}", frame, color_path.display());
    Ok(())
}
