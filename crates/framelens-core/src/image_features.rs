//! Image Feature Engine
//!
//! Composes geometry, the Color Analyzer and the Edge & Sharpness Analyzer
//! into a per-image feature set.
//!
//! Every per-metric method loads the image afresh and never fails: a load or
//! decode error is logged and converted to the metric's sentinel. Use
//! [`ImageAnalyzer::analyze`] to get the error itself.

use crate::buffer::{ColorTriplet, Dimensions, PixelBuffer};
use crate::cluster::KMeansConfig;
use crate::color;
use crate::edges;
use crate::error::{AnalysisError, Result};
use crate::source::ImageLoader;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cluster count used when none is requested.
pub const DEFAULT_CLUSTERS: usize = 3;

/// Every metric for one still image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatureSet {
	/// Width and height in pixels
	#[serde(flatten)]
	pub dimensions: Dimensions,
	/// 1 for grayscale, 3 for color
	pub channels: usize,
	/// Whether the image has a single channel
	pub is_grayscale: bool,
	/// Unweighted average of the channel means
	pub average_brightness: f64,
	/// `(max + 1) / (min + 1)` over luma
	pub contrast_ratio: f64,
	/// Mean HSV saturation in `[0, 255]`
	pub saturation: f64,
	/// Three 256-bin histograms in R, G, B order
	pub histogram: Vec<Vec<u64>>,
	/// `width / height`
	pub aspect_ratio: f64,
	/// Luma entropy in bits
	pub entropy: f64,
	/// Pixels on the edge map
	pub edge_count: u64,
	/// Laplacian variance
	pub blur_score: f64,
	/// Cluster centers in R, G, B order
	pub dominant_colors: Vec<ColorTriplet>,
}

impl ImageFeatureSet {
	/// Compute every metric from a decoded buffer.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::EmptyBuffer`] for an unloaded buffer and
	/// [`AnalysisError::InvalidConfig`] for `clusters == 0`.
	pub fn from_buffer(buffer: &PixelBuffer, clusters: usize, clustering: &KMeansConfig) -> Result<Self> {
		buffer.ensure_loaded()?;
		let dimensions = buffer.dimensions();
		Ok(Self {
			dimensions,
			channels: buffer.channels(),
			is_grayscale: color::is_grayscale(buffer),
			average_brightness: color::brightness(buffer)?,
			contrast_ratio: color::contrast_ratio(buffer)?,
			saturation: color::saturation(buffer)?,
			histogram: color::color_histogram(buffer)?,
			aspect_ratio: dimensions.aspect_ratio().unwrap_or(-1.0),
			entropy: stats::entropy(buffer)?,
			edge_count: edges::edge_count(buffer)?,
			blur_score: edges::blur_score(buffer)?,
			dominant_colors: color::dominant_colors(buffer, clusters, clustering)?,
		})
	}
}

/// Image feature extraction over an injected loader.
#[derive(Clone, Debug)]
pub struct ImageAnalyzer<L> {
	loader: L,
	clusters: usize,
	clustering: KMeansConfig,
}

impl<L: ImageLoader> ImageAnalyzer<L> {
	/// Analyzer with default clustering and [`DEFAULT_CLUSTERS`] colors.
	pub fn new(loader: L) -> Self {
		Self {
			loader,
			clusters: DEFAULT_CLUSTERS,
			clustering: KMeansConfig::default(),
		}
	}

	/// Cluster count used by [`Self::analyze`].
	#[must_use]
	pub const fn with_clusters(mut self, clusters: usize) -> Self {
		self.clusters = clusters;
		self
	}

	/// Override the k-means parameters.
	#[must_use]
	pub fn with_clustering(mut self, clustering: KMeansConfig) -> Self {
		self.clustering = clustering;
		self
	}

	/// Load and check the image. An empty buffer counts as a load failure.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the image cannot be decoded.
	pub fn load(&self, path: impl AsRef<Path>) -> Result<PixelBuffer> {
		let path = path.as_ref();
		let buffer = self.loader.load(path)?;
		if buffer.is_empty() {
			return Err(AnalysisError::load(path, "decoder produced an empty image"));
		}
		Ok(buffer)
	}

	/// The full feature set.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the image cannot be decoded.
	pub fn analyze(&self, path: impl AsRef<Path>) -> Result<ImageFeatureSet> {
		let buffer = self.load(path)?;
		ImageFeatureSet::from_buffer(&buffer, self.clusters, &self.clustering)
	}

	/// Width and height, or [`Dimensions::UNKNOWN`].
	pub fn dimensions(&self, path: impl AsRef<Path>) -> Dimensions {
		self.measure(path.as_ref(), "dimensions", Dimensions::UNKNOWN, |b| Ok(b.dimensions()))
	}

	/// Whether the image has one channel; `false` on failure.
	pub fn is_grayscale(&self, path: impl AsRef<Path>) -> bool {
		self.measure(path.as_ref(), "grayscale", false, |b| Ok(color::is_grayscale(b)))
	}

	/// Average brightness, or `-1.0`.
	pub fn average_brightness(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "brightness", -1.0, color::brightness)
	}

	/// 1 or 3, or `-1`.
	pub fn channel_count(&self, path: impl AsRef<Path>) -> i32 {
		self.measure(path.as_ref(), "channel count", -1, |b| {
			Ok(if color::is_grayscale(b) { 1 } else { 3 })
		})
	}

	/// Edge pixel count, or `-1`.
	pub fn edge_count(&self, path: impl AsRef<Path>) -> i64 {
		self.measure(path.as_ref(), "edge count", -1, |b| {
			edges::edge_count(b).map(|count| i64::try_from(count).unwrap_or(i64::MAX))
		})
	}

	/// `k` dominant colors, or an empty list.
	pub fn dominant_colors(&self, path: impl AsRef<Path>, k: usize) -> Vec<ColorTriplet> {
		self.measure(path.as_ref(), "dominant colors", Vec::new(), |b| {
			color::dominant_colors(b, k, &self.clustering)
		})
	}

	/// Laplacian variance, or `-1.0`.
	pub fn blur_score(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "blur score", -1.0, edges::blur_score)
	}

	/// Luma entropy in bits, or `-1.0`.
	pub fn entropy(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "entropy", -1.0, stats::entropy)
	}

	/// Contrast ratio, or `-1.0`.
	pub fn contrast_ratio(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "contrast ratio", -1.0, color::contrast_ratio)
	}

	/// Mean saturation, or `-1.0`.
	pub fn saturation(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "saturation", -1.0, color::saturation)
	}

	/// `width / height`, or `-1.0`.
	pub fn aspect_ratio(&self, path: impl AsRef<Path>) -> f64 {
		self.measure(path.as_ref(), "aspect ratio", -1.0, |b| {
			Ok(b.dimensions().aspect_ratio().unwrap_or(-1.0))
		})
	}

	/// Three 256-bin histograms, or an empty list.
	pub fn histogram(&self, path: impl AsRef<Path>) -> Vec<Vec<u64>> {
		self.measure(path.as_ref(), "histogram", Vec::new(), color::color_histogram)
	}

	fn measure<T>(
		&self,
		path: &Path,
		metric: &'static str,
		sentinel: T,
		compute: impl FnOnce(&PixelBuffer) -> Result<T>,
	) -> T {
		match self.load(path).and_then(|buffer| compute(&buffer)) {
			Ok(value) => value,
			Err(error) => {
				tracing::warn!(path = %path.display(), metric, %error, "image metric failed");
				sentinel
			}
		}
	}
}
