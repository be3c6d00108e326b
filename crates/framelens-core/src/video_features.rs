//! Video Feature Engine
//!
//! Static metadata (frame count, FPS, resolution, duration, first frame) comes
//! from a freshly opened stream. Temporal metrics each run their own bounded
//! sampling pass, so any metric can be called alone and none affects another.
//!
//! | metric | pass | failure sentinel |
//! |--------|------|------------------|
//! | frame count | metadata | `-1` |
//! | fps, duration | metadata | `-1.0` |
//! | resolution | metadata | `(-1, -1)` |
//! | first frame | first read | `None` |
//! | brightness | [`SamplingPass::Brightness`] | `-1.0` |
//! | grayscale | first read | `false` |
//! | motion | [`SamplingPass::Motion`] | `-1.0` |
//! | dominant colors | [`SamplingPass::Color`] | empty |
//! | scene changes | [`SamplingPass::SceneChange`] | `None` |
//! | color consistency | [`SamplingPass::Consistency`] | `-1.0` |
//! | frame-rate stability | [`SamplingPass::Timing`] | `-1.0` |

use crate::buffer::{ColorTriplet, Dimensions, PixelBuffer};
use crate::cluster::{kmeans, KMeansConfig};
use crate::color;
use crate::error::{AnalysisError, Result};
use crate::sampler::{FrameSampler, SamplingPass, SamplingPolicy};
use crate::scene::{detect_scene_changes, SceneConfig};
use crate::source::{FrameStream, ImageWriter, VideoLoader};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dominant colors reported for a video.
pub const VIDEO_CLUSTERS: usize = 3;

/// Geometry of the first-frame snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
	/// Width in pixels
	pub width: u32,
	/// Height in pixels
	pub height: u32,
	/// 1 or 3
	pub channels: usize,
}

impl From<&PixelBuffer> for FrameSummary {
	fn from(buffer: &PixelBuffer) -> Self {
		Self {
			width: buffer.width(),
			height: buffer.height(),
			channels: buffer.channels(),
		}
	}
}

/// Every metric for one video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoFeatureSet {
	/// Frames reported by the container
	pub frame_count: i64,
	/// Nominal frame rate
	pub fps: f64,
	/// Frame geometry
	#[serde(flatten)]
	pub resolution: Dimensions,
	/// Seconds, `-1.0` when the frame rate is unknown
	pub duration: f64,
	/// Decoded first frame
	#[serde(skip)]
	pub first_frame: Option<PixelBuffer>,
	/// Geometry of [`Self::first_frame`]
	pub first_frame_summary: Option<FrameSummary>,
	/// Mean brightness over the brightness pass
	pub average_brightness: f64,
	/// Whether the first frame has one channel
	pub is_grayscale: bool,
	/// Mean absolute grayscale difference between consecutive frames
	pub motion_score: f64,
	/// Cluster centers of pooled frame colors
	pub dominant_colors: Vec<ColorTriplet>,
	/// Sampled frame indices that start a new scene, `None` if the pass failed
	pub scene_changes: Option<Vec<usize>>,
	/// Variance of frame intervals in nominal frame units
	pub frame_rate_stability: f64,
	/// Coefficient of variation of per-frame mean colors, in `[0, 1]`
	pub color_consistency: f64,
}

/// Video feature extraction over an injected loader.
#[derive(Clone, Debug)]
pub struct VideoAnalyzer<L> {
	loader: L,
	policy: SamplingPolicy,
	clustering: KMeansConfig,
	scene: SceneConfig,
}

impl<L: VideoLoader> VideoAnalyzer<L> {
	/// Analyzer with default sampling, clustering and scene thresholds.
	pub fn new(loader: L) -> Self {
		Self {
			loader,
			policy: SamplingPolicy::default(),
			clustering: KMeansConfig::default(),
			scene: SceneConfig::default(),
		}
	}

	/// Override the per-pass frame caps.
	#[must_use]
	pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Override the k-means parameters.
	#[must_use]
	pub fn with_clustering(mut self, clustering: KMeansConfig) -> Self {
		self.clustering = clustering;
		self
	}

	/// Override the scene-change thresholds.
	#[must_use]
	pub fn with_scene(mut self, scene: SceneConfig) -> Self {
		self.scene = scene;
		self
	}

	/// Active sampling policy.
	pub const fn policy(&self) -> &SamplingPolicy {
		&self.policy
	}

	/// The full feature set.
	///
	/// Only an open failure is an error; metrics that fail afterwards carry
	/// their sentinels.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the video cannot be opened.
	pub fn analyze(&self, path: impl AsRef<Path>) -> Result<VideoFeatureSet> {
		let path = path.as_ref();
		let stream = self.loader.open(path)?;
		let frame_count = i64::try_from(stream.frame_count()).unwrap_or(i64::MAX);
		let fps = stream.fps();
		let resolution = stream.resolution();
		drop(stream);

		let first_frame = self.first_frame(path);
		tracing::debug!(path = %path.display(), frame_count, fps, "analyzing video");

		Ok(VideoFeatureSet {
			frame_count,
			fps,
			resolution,
			duration: self.duration(path),
			first_frame_summary: first_frame.as_ref().map(FrameSummary::from),
			is_grayscale: first_frame.as_ref().is_some_and(color::is_grayscale),
			first_frame,
			average_brightness: self.average_brightness(path),
			motion_score: self.motion_score(path),
			dominant_colors: self.dominant_colors(path),
			scene_changes: self.scene_changes(path),
			frame_rate_stability: self.frame_rate_stability(path),
			color_consistency: self.color_consistency(path),
		})
	}

	/// Container frame count, or `-1`.
	pub fn frame_count(&self, path: impl AsRef<Path>) -> i64 {
		or_sentinel(path.as_ref(), "frame count", -1, |path| {
			let stream = self.loader.open(path)?;
			Ok(i64::try_from(stream.frame_count()).unwrap_or(i64::MAX))
		})
	}

	/// Nominal frame rate, or `-1.0`.
	pub fn fps(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "fps", -1.0, |path| Ok(self.loader.open(path)?.fps()))
	}

	/// Frame geometry, or [`Dimensions::UNKNOWN`].
	pub fn resolution(&self, path: impl AsRef<Path>) -> Dimensions {
		or_sentinel(path.as_ref(), "resolution", Dimensions::UNKNOWN, |path| {
			Ok(self.loader.open(path)?.resolution())
		})
	}

	/// `frame_count / fps` in seconds, or `-1.0` when the rate is unknown.
	pub fn duration(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "duration", -1.0, |path| {
			let stream = self.loader.open(path)?;
			let fps = stream.fps();
			if fps <= 0.0 {
				return Err(AnalysisError::UnknownFrameRate);
			}
			Ok(stream.frame_count() as f64 / fps)
		})
	}

	/// The first decoded frame, or `None`.
	pub fn first_frame(&self, path: impl AsRef<Path>) -> Option<PixelBuffer> {
		or_sentinel(path.as_ref(), "first frame", None, |path| {
			let mut stream = self.loader.open(path)?;
			match stream.read_frame()? {
				Some(frame) if !frame.is_empty() => Ok(Some(frame)),
				_ => Err(AnalysisError::load(path, "stream has no frames")),
			}
		})
	}

	/// Write the first frame through `writer`; `true` on success.
	pub fn save_first_frame(
		&self,
		path: impl AsRef<Path>,
		output: impl AsRef<Path>,
		writer: &impl ImageWriter,
	) -> bool {
		let output = output.as_ref();
		self.first_frame(path).is_some_and(|frame| match writer.write(&frame, output) {
			Ok(()) => true,
			Err(error) => {
				tracing::warn!(output = %output.display(), %error, "could not save first frame");
				false
			}
		})
	}

	/// Mean per-frame brightness over the brightness pass, or `-1.0`.
	pub fn average_brightness(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "brightness", -1.0, |path| {
			let levels = self
				.sampler()
				.sample(path, SamplingPass::Brightness)?
				.map(|frame| color::brightness(&frame))
				.collect::<Result<Vec<f64>>>()?;
			stats::average(&levels)
		})
	}

	/// Whether the first frame has one channel; `false` on failure.
	pub fn is_grayscale(&self, path: impl AsRef<Path>) -> bool {
		self.first_frame(path).is_some_and(|frame| color::is_grayscale(&frame))
	}

	/// Mean absolute grayscale difference per consecutive pair, or `-1.0`.
	///
	/// Fewer than two sampled frames score `0.0`.
	pub fn motion_score(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "motion", -1.0, |path| {
			let differences = self.differences(path, SamplingPass::Motion)?;
			if differences.is_empty() {
				return Ok(0.0);
			}
			stats::average(&differences)
		})
	}

	/// Three dominant colors over the pooled color pass, or an empty list.
	pub fn dominant_colors(&self, path: impl AsRef<Path>) -> Vec<ColorTriplet> {
		or_sentinel(path.as_ref(), "dominant colors", Vec::new(), |path| {
			let mut pooled = Vec::new();
			for frame in self.sampler().sample(path, SamplingPass::Color)? {
				pooled.extend(frame.observations());
			}
			Ok(kmeans(&pooled, VIDEO_CLUSTERS, &self.clustering)?.centers)
		})
	}

	/// Ascending indices of sampled frames that start a new scene, or `None`.
	pub fn scene_changes(&self, path: impl AsRef<Path>) -> Option<Vec<usize>> {
		or_sentinel(path.as_ref(), "scene changes", None, |path| {
			let differences = self.differences(path, SamplingPass::SceneChange)?;
			Ok(Some(detect_scene_changes(&differences, &self.scene)))
		})
	}

	/// Variance of presentation intervals in nominal frame units, or `-1.0`.
	///
	/// Streams without timestamps have a constant nominal interval and score `0.0`.
	pub fn frame_rate_stability(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "frame-rate stability", -1.0, |path| {
			let mut stream = self.loader.open(path)?;
			let fps = stream.fps();
			if fps <= 0.0 {
				return Err(AnalysisError::UnknownFrameRate);
			}
			let Some(mut stamps) = stream.timestamps(self.policy.max_timing_frames)? else {
				return Ok(0.0);
			};
			stamps.sort_by(f64::total_cmp);
			let intervals: Vec<f64> = stamps.windows(2).map(|w| (w[1] - w[0]) * fps).collect();
			if intervals.is_empty() {
				return Ok(0.0);
			}
			stats::variance(&intervals)
		})
	}

	/// Averaged per-channel coefficient of variation of frame mean colors,
	/// clamped to `[0, 1]`, or `-1.0`.
	pub fn color_consistency(&self, path: impl AsRef<Path>) -> f64 {
		or_sentinel(path.as_ref(), "color consistency", -1.0, |path| {
			let means = self
				.sampler()
				.sample(path, SamplingPass::Consistency)?
				.map(|frame| color::mean_color(&frame))
				.collect::<Result<Vec<ColorTriplet>>>()?;
			color_variation(&means)
		})
	}

	fn sampler(&self) -> FrameSampler<'_, L> {
		FrameSampler::new(&self.loader, &self.policy)
	}

	/// Mean absolute grayscale difference of each consecutive sampled pair.
	fn differences(&self, path: &Path, pass: SamplingPass) -> Result<Vec<f64>> {
		let mut previous: Option<PixelBuffer> = None;
		let mut differences = Vec::new();
		for frame in self.sampler().sample(path, pass)? {
			let gray = frame.to_grayscale();
			if let Some(prev) = &previous {
				differences.push(stats::mean_abs_diff(prev, &gray)?);
			}
			previous = Some(gray);
		}
		tracing::debug!(path = %path.display(), %pass, pairs = differences.len(), "frame differences");
		Ok(differences)
	}
}

/// Run `compute`, logging a failure and substituting `sentinel`.
fn or_sentinel<T>(
	path: &Path,
	metric: &'static str,
	sentinel: T,
	compute: impl FnOnce(&Path) -> Result<T>,
) -> T {
	match compute(path) {
		Ok(value) => value,
		Err(error) => {
			tracing::warn!(path = %path.display(), metric, %error, "video metric failed");
			sentinel
		}
	}
}

/// Per-channel coefficient of variation averaged over R, G, B and clamped.
fn color_variation(means: &[ColorTriplet]) -> Result<f64> {
	if means.is_empty() {
		return Err(AnalysisError::EmptyBuffer);
	}
	let mut total = 0.0;
	for channel in 0..3 {
		let values: Vec<f64> = means.iter().map(|color| color[channel]).collect();
		let mean = stats::average(&values)?;
		if mean > 0.0 {
			total += stats::std_dev(&values)? / mean;
		}
	}
	Ok((total / 3.0).clamp(0.0, 1.0))
}
