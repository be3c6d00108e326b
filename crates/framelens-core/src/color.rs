//! Color Analyzer
//!
//! Whole-buffer color measurements built on the statistical primitives.
//!
//! - Brightness: unweighted average of the channel means
//! - Contrast ratio: `(max + 1) / (min + 1)` over luma; exactly `1.0` when flat
//! - Saturation: mean HSV saturation (`(max - min) / max` per pixel), scaled to `[0, 255]`
//! - Histogram: always three 256-bin channels; a gray plane is replicated
//! - Dominant colors: k-means centroids in R, G, B order

use crate::buffer::{ColorTriplet, PixelBuffer};
use crate::cluster::{kmeans, KMeansConfig};
use crate::error::Result;
use crate::stats;

/// Offset added to both ends of the contrast ratio so black never divides by zero.
const CONTRAST_EPSILON: f64 = 1.0;

/// True iff the buffer has a single channel.
#[must_use]
pub const fn is_grayscale(buffer: &PixelBuffer) -> bool {
	buffer.channels() == 1
}

/// Average intensity over all channels.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn brightness(buffer: &PixelBuffer) -> Result<f64> {
	stats::mean(buffer)
}

/// Ratio of brightest to darkest luma, offset by one level.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn contrast_ratio(buffer: &PixelBuffer) -> Result<f64> {
	let (min, max) = stats::min_max(buffer)?;
	Ok((f64::from(max) + CONTRAST_EPSILON) / (f64::from(min) + CONTRAST_EPSILON))
}

/// Mean HSV saturation scaled to `[0, 255]`. Gray buffers score `0.0`.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn saturation(buffer: &PixelBuffer) -> Result<f64> {
	buffer.ensure_loaded()?;
	if is_grayscale(buffer) {
		return Ok(0.0);
	}

	let total: f64 = buffer
		.pixels()
		.map(|pixel| {
			let max = pixel.iter().copied().max().unwrap_or(0);
			let min = pixel.iter().copied().min().unwrap_or(0);
			if max == 0 {
				0.0
			} else {
				255.0 * f64::from(max - min) / f64::from(max)
			}
		})
		.sum();
	Ok(total / buffer.pixel_count() as f64)
}

/// Three 256-bin histograms in R, G, B order.
///
/// Gray input is reported as three identical channels.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn color_histogram(buffer: &PixelBuffer) -> Result<Vec<Vec<u64>>> {
	let mut bins = stats::histogram(buffer)?;
	if let [plane] = bins.as_slice() {
		let plane = plane.clone();
		bins = vec![plane.clone(), plane.clone(), plane];
	}
	Ok(bins)
}

/// Per-channel mean color; gray input yields `[v, v, v]`.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn mean_color(buffer: &PixelBuffer) -> Result<ColorTriplet> {
	let means = stats::channel_means(buffer)?;
	Ok(match means.as_slice() {
		&[r, g, b] => [r, g, b],
		&[v] => [v, v, v],
		_ => [0.0; 3],
	})
}

/// `k` dominant colors of one buffer.
///
/// # Errors
///
/// Returns [`crate::AnalysisError::EmptyBuffer`] for an unloaded buffer and
/// [`crate::AnalysisError::InvalidConfig`] for `k == 0`.
pub fn dominant_colors(
	buffer: &PixelBuffer,
	k: usize,
	config: &KMeansConfig,
) -> Result<Vec<ColorTriplet>> {
	buffer.ensure_loaded()?;
	let observations: Vec<[u8; 3]> = buffer.observations().collect();
	Ok(kmeans(&observations, k, config)?.centers)
}
