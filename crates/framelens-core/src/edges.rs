//! Edge & Sharpness Analyzer
//!
//! Both measurements work on the luma plane.
//!
//! - Edge count: Canny with hysteresis thresholds 100 / 200, counting edge pixels
//! - Blur score: variance of the 4-neighbour Laplacian response at every pixel,
//!   borders clamped. Lower means blurrier; a flat image scores exactly `0.0`.

use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::stats;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::laplacian_filter;

/// Lower hysteresis threshold for edge detection.
pub const EDGE_LOW_THRESHOLD: f32 = 100.0;
/// Upper hysteresis threshold for edge detection.
pub const EDGE_HIGH_THRESHOLD: f32 = 200.0;

/// Number of pixels on the Canny edge map.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn edge_count(buffer: &PixelBuffer) -> Result<u64> {
	let gray = luma_image(buffer)?;
	let edges = canny(&gray, EDGE_LOW_THRESHOLD, EDGE_HIGH_THRESHOLD);
	Ok(edges.pixels().filter(|pixel| pixel.0[0] > 0).count() as u64)
}

/// Variance of the Laplacian response.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn blur_score(buffer: &PixelBuffer) -> Result<f64> {
	stats::variance(&laplacian(buffer)?)
}

/// Kernel `[[0, 1, 0], [1, -4, 1], [0, 1, 0]]` at every pixel, edges replicated.
fn laplacian(buffer: &PixelBuffer) -> Result<Vec<f64>> {
	let gray = luma_image(buffer)?;
	Ok(laplacian_filter(&gray).pixels().map(|pixel| f64::from(pixel.0[0])).collect())
}

fn luma_image(buffer: &PixelBuffer) -> Result<GrayImage> {
	buffer.ensure_loaded()?;
	let gray = buffer.to_grayscale();
	let (width, height) = (gray.width(), gray.height());
	GrayImage::from_raw(width, height, gray.into_data())
		.ok_or_else(|| AnalysisError::InvalidBuffer(format!("{width}x{height} luma plane")))
}
