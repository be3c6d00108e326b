//! Statistical Primitives
//!
//! Numeric building blocks shared by the analyzers: per-channel means,
//! histograms, Shannon entropy, population variance and intensity range.
//!
//! Every buffer primitive fails with [`AnalysisError::EmptyBuffer`] on a
//! zero-sized buffer; sequence primitives fail the same way on an empty slice.

use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};

/// Number of intensity levels in an 8-bit channel.
pub const LEVELS: usize = 256;

/// Per-channel average intensity, in channel order.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn channel_means(buffer: &PixelBuffer) -> Result<Vec<f64>> {
	buffer.ensure_loaded()?;
	let channels = buffer.channels();
	let mut sums = vec![0_u64; channels];
	for pixel in buffer.pixels() {
		for (sum, &sample) in sums.iter_mut().zip(pixel) {
			*sum += u64::from(sample);
		}
	}
	let count = buffer.pixel_count() as f64;
	Ok(sums.into_iter().map(|sum| sum as f64 / count).collect())
}

/// Unweighted average of the channel means.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn mean(buffer: &PixelBuffer) -> Result<f64> {
	let means = channel_means(buffer)?;
	Ok(means.iter().sum::<f64>() / means.len() as f64)
}

/// One 256-bin histogram per native channel.
///
/// Each histogram sums to `width * height`.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn histogram(buffer: &PixelBuffer) -> Result<Vec<Vec<u64>>> {
	buffer.ensure_loaded()?;
	let mut bins = vec![vec![0_u64; LEVELS]; buffer.channels()];
	for pixel in buffer.pixels() {
		for (channel, &sample) in bins.iter_mut().zip(pixel) {
			channel[usize::from(sample)] += 1;
		}
	}
	Ok(bins)
}

/// Shannon entropy in bits of the luma distribution, in `[0, 8]`.
///
/// Color buffers are converted to luma first.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn entropy(buffer: &PixelBuffer) -> Result<f64> {
	let gray = buffer.to_grayscale();
	let bins = histogram(&gray)?;
	let total = gray.pixel_count() as f64;

	let mut bits = 0.0;
	for &count in bins.iter().flatten().filter(|&&count| count > 0) {
		let p = count as f64 / total;
		bits -= p * p.log2();
	}
	Ok(bits)
}

/// Smallest and largest luma value.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer.
pub fn min_max(buffer: &PixelBuffer) -> Result<(u8, u8)> {
	buffer.ensure_loaded()?;
	let gray = buffer.to_grayscale();
	let data = gray.data();
	let min = data.iter().copied().min().unwrap_or(0);
	let max = data.iter().copied().max().unwrap_or(0);
	Ok((min, max))
}

/// Arithmetic mean of a sequence.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an empty slice.
pub fn average(values: &[f64]) -> Result<f64> {
	if values.is_empty() {
		return Err(AnalysisError::EmptyBuffer);
	}
	Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance of a sequence (two-pass).
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an empty slice.
pub fn variance(values: &[f64]) -> Result<f64> {
	let mean = average(values)?;
	let squared: f64 = values.iter().map(|&v| (v - mean).powi(2)).sum();
	Ok(squared / values.len() as f64)
}

/// Population standard deviation of a sequence.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for an empty slice.
pub fn std_dev(values: &[f64]) -> Result<f64> {
	variance(values).map(f64::sqrt)
}

/// Mean absolute difference between two same-shaped buffers.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] for unloaded input and
/// [`AnalysisError::FrameMismatch`] when the shapes differ.
pub fn mean_abs_diff(previous: &PixelBuffer, current: &PixelBuffer) -> Result<f64> {
	previous.ensure_loaded()?;
	current.ensure_loaded()?;
	if previous.shape() != current.shape() {
		return Err(AnalysisError::FrameMismatch {
			expected: previous.shape(),
			actual: current.shape(),
		});
	}
	let total: u64 = previous
		.data()
		.iter()
		.zip(current.data())
		.map(|(&a, &b)| u64::from(a.abs_diff(b)))
		.sum();
	Ok(total as f64 / previous.data().len() as f64)
}
