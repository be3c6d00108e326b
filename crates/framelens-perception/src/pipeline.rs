//! Path-level entry points and the batch pipeline.
//!
//! The free functions build a default analyzer per call and return the same
//! sentinels as the core engines, so a bad file never propagates a fault.
//! [`Pipeline`] carries configuration across many files and collects an
//! [`AnalysisReport`].

use crate::image_file::{ImageFileLoader, ImageFileWriter};
use crate::video::{FfmpegVideoLoader, VideoConfig};
use framelens_core::{
	classify, AnalysisError, ColorTriplet, Dimensions, ImageAnalyzer, ImageFeatureSet,
	KMeansConfig, MediaKind, PixelBuffer, SamplingPolicy, SceneConfig, VideoAnalyzer,
	VideoFeatureSet, DEFAULT_CLUSTERS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn images() -> ImageAnalyzer<ImageFileLoader> {
	ImageAnalyzer::new(ImageFileLoader)
}

fn videos() -> VideoAnalyzer<FfmpegVideoLoader> {
	VideoAnalyzer::new(FfmpegVideoLoader::default())
}

// ============================================================================
// Image metrics
// ============================================================================

/// Width and height, or `(-1, -1)`.
pub fn image_dimensions(path: impl AsRef<Path>) -> Dimensions {
	images().dimensions(path)
}

/// Whether the image is single-channel; `false` on failure.
pub fn is_image_grayscale(path: impl AsRef<Path>) -> bool {
	images().is_grayscale(path)
}

/// Average brightness, or `-1.0`.
pub fn image_average_brightness(path: impl AsRef<Path>) -> f64 {
	images().average_brightness(path)
}

/// 1 or 3, or `-1`.
pub fn image_channel_count(path: impl AsRef<Path>) -> i32 {
	images().channel_count(path)
}

/// Edge pixel count, or `-1`.
pub fn image_edge_count(path: impl AsRef<Path>) -> i64 {
	images().edge_count(path)
}

/// `k` dominant colors, or an empty list.
pub fn image_dominant_colors(path: impl AsRef<Path>, k: usize) -> Vec<ColorTriplet> {
	images().dominant_colors(path, k)
}

/// Laplacian variance, or `-1.0`.
pub fn image_blur_score(path: impl AsRef<Path>) -> f64 {
	images().blur_score(path)
}

/// Luma entropy in bits, or `-1.0`.
pub fn image_entropy(path: impl AsRef<Path>) -> f64 {
	images().entropy(path)
}

/// Contrast ratio, or `-1.0`.
pub fn image_contrast_ratio(path: impl AsRef<Path>) -> f64 {
	images().contrast_ratio(path)
}

/// Mean saturation, or `-1.0`.
pub fn image_saturation(path: impl AsRef<Path>) -> f64 {
	images().saturation(path)
}

/// `width / height`, or `-1.0`.
pub fn image_aspect_ratio(path: impl AsRef<Path>) -> f64 {
	images().aspect_ratio(path)
}

/// Three 256-bin histograms, or an empty list.
pub fn image_histogram(path: impl AsRef<Path>) -> Vec<Vec<u64>> {
	images().histogram(path)
}

/// Every image metric with [`DEFAULT_CLUSTERS`] dominant colors.
///
/// # Errors
///
/// Returns [`AnalysisError::Load`] when the image cannot be decoded.
pub fn analyze_image(path: impl AsRef<Path>) -> framelens_core::Result<ImageFeatureSet> {
	images().analyze(path)
}

// ============================================================================
// Video metrics
// ============================================================================

/// Container frame count, or `-1`.
pub fn video_frame_count(path: impl AsRef<Path>) -> i64 {
	videos().frame_count(path)
}

/// Nominal frame rate, or `-1.0`.
pub fn video_fps(path: impl AsRef<Path>) -> f64 {
	videos().fps(path)
}

/// Frame geometry, or `(-1, -1)`.
pub fn video_resolution(path: impl AsRef<Path>) -> Dimensions {
	videos().resolution(path)
}

/// Seconds, or `-1.0`.
pub fn video_duration(path: impl AsRef<Path>) -> f64 {
	videos().duration(path)
}

/// First decoded frame, or `None`.
pub fn video_first_frame(path: impl AsRef<Path>) -> Option<PixelBuffer> {
	videos().first_frame(path)
}

/// Save the first frame to `output` (format from its extension).
pub fn save_first_frame_as_image(path: impl AsRef<Path>, output: impl AsRef<Path>) -> bool {
	videos().save_first_frame(path, output, &ImageFileWriter)
}

/// Mean brightness over the first 100 frames, or `-1.0`.
pub fn video_average_brightness(path: impl AsRef<Path>) -> f64 {
	videos().average_brightness(path)
}

/// Whether the first frame is single-channel; `false` on failure.
pub fn is_video_grayscale(path: impl AsRef<Path>) -> bool {
	videos().is_grayscale(path)
}

/// Mean consecutive-frame difference over the first 50 frames, or `-1.0`.
pub fn video_motion_score(path: impl AsRef<Path>) -> f64 {
	videos().motion_score(path)
}

/// Three dominant colors over the first 10 frames, or an empty list.
pub fn video_dominant_colors(path: impl AsRef<Path>) -> Vec<ColorTriplet> {
	videos().dominant_colors(path)
}

/// Indices of frames that start a new scene, or `None`.
pub fn video_scene_changes(path: impl AsRef<Path>) -> Option<Vec<usize>> {
	videos().scene_changes(path)
}

/// Variance of frame intervals in nominal frame units, or `-1.0`.
pub fn video_frame_rate_stability(path: impl AsRef<Path>) -> f64 {
	videos().frame_rate_stability(path)
}

/// Cross-frame color variability in `[0, 1]`, or `-1.0`.
pub fn video_color_consistency(path: impl AsRef<Path>) -> f64 {
	videos().color_consistency(path)
}

/// Every video metric.
///
/// # Errors
///
/// Returns [`AnalysisError::Load`] when the video cannot be opened.
pub fn analyze_video(path: impl AsRef<Path>) -> framelens_core::Result<VideoFeatureSet> {
	videos().analyze(path)
}

// ============================================================================
// Batch pipeline
// ============================================================================

/// Configuration for [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
	/// Per-pass video frame caps
	pub sampling: SamplingPolicy,
	/// Dominant colors per image
	pub clusters: usize,
	/// k-means parameters
	pub clustering: KMeansConfig,
	/// Scene-change thresholds
	pub scene: SceneConfig,
	/// External tool locations
	pub video: VideoConfig,
	/// Where `<stem>_first_frame.jpg` snapshots are written, if anywhere
	pub first_frame_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			sampling: SamplingPolicy::default(),
			clusters: DEFAULT_CLUSTERS,
			clustering: KMeansConfig::default(),
			scene: SceneConfig::default(),
			video: VideoConfig::default(),
			first_frame_dir: None,
		}
	}
}

impl PipelineConfig {
	/// # Errors
	///
	/// Returns [`AnalysisError::InvalidConfig`] for zero caps, zero clusters
	/// or bad scene thresholds.
	pub fn validate(&self) -> framelens_core::Result<()> {
		self.sampling.validate()?;
		self.scene.validate()?;
		if self.clusters == 0 {
			return Err(AnalysisError::InvalidConfig("cluster count must be positive".into()));
		}
		Ok(())
	}
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
	/// Every metric was computed
	Analyzed(T),
	/// The file could not be analyzed
	Failed {
		/// Always `-1`
		width: i32,
		/// Always `-1`
		height: i32,
		/// Human-readable cause
		error: String,
	},
}

impl<T> Outcome<T> {
	fn from_result(result: framelens_core::Result<T>) -> Self {
		match result {
			Ok(features) => Self::Analyzed(features),
			Err(error) => Self::Failed {
				width: Dimensions::UNKNOWN.width,
				height: Dimensions::UNKNOWN.height,
				error: error.to_string(),
			},
		}
	}

	/// The features, if analysis succeeded.
	pub const fn features(&self) -> Option<&T> {
		match self {
			Self::Analyzed(features) => Some(features),
			Self::Failed { .. } => None,
		}
	}
}

/// One analyzed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
	/// Input path as given
	pub file: PathBuf,
	/// Features or failure
	#[serde(flatten)]
	pub outcome: Outcome<ImageFeatureSet>,
}

/// One analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
	/// Input path as given
	pub file: PathBuf,
	/// Features or failure
	#[serde(flatten)]
	pub outcome: Outcome<VideoFeatureSet>,
	/// Saved first-frame snapshot
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_frame_image: Option<PathBuf>,
}

/// A file the pipeline refused to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
	/// Input path as given
	pub file: PathBuf,
	/// Why it was skipped
	pub reason: String,
}

/// Aggregate of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
	/// Still images, in input order
	pub images: Vec<ImageRecord>,
	/// Videos, in input order
	pub videos: Vec<VideoRecord>,
	/// Missing or unsupported inputs
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub skipped: Vec<SkippedFile>,
}

impl AnalysisReport {
	/// Files that were analyzed or attempted.
	#[must_use]
	pub fn len(&self) -> usize {
		self.images.len() + self.videos.len()
	}

	/// Whether nothing was analyzed.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Records whose analysis failed.
	#[must_use]
	pub fn failures(&self) -> usize {
		let images = self.images.iter().filter(|r| r.outcome.features().is_none()).count();
		let videos = self.videos.iter().filter(|r| r.outcome.features().is_none()).count();
		images + videos
	}

	/// Pretty-printed JSON document.
	///
	/// # Errors
	///
	/// Returns an error if serialization fails.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

/// Configured analyzers over real files.
#[derive(Debug, Clone)]
pub struct Pipeline {
	images: ImageAnalyzer<ImageFileLoader>,
	videos: VideoAnalyzer<FfmpegVideoLoader>,
	first_frame_dir: Option<PathBuf>,
}

impl Pipeline {
	/// Build analyzers from `config`.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::InvalidConfig`] if validation fails.
	pub fn new(config: PipelineConfig) -> framelens_core::Result<Self> {
		config.validate()?;
		let images = ImageAnalyzer::new(ImageFileLoader)
			.with_clusters(config.clusters)
			.with_clustering(config.clustering.clone());
		let videos = VideoAnalyzer::new(FfmpegVideoLoader::new(config.video))
			.with_policy(config.sampling)
			.with_clustering(config.clustering)
			.with_scene(config.scene);
		Ok(Self {
			images,
			videos,
			first_frame_dir: config.first_frame_dir,
		})
	}

	/// Analyze every path, in order.
	pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> AnalysisReport {
		let mut report = AnalysisReport::default();
		for path in paths {
			self.analyze_into(path.as_ref(), &mut report);
		}
		tracing::info!(
			images = report.images.len(),
			videos = report.videos.len(),
			skipped = report.skipped.len(),
			failures = report.failures(),
			"analysis finished"
		);
		report
	}

	/// Analyze one path and append it to `report`.
	pub fn analyze_into(&self, path: &Path, report: &mut AnalysisReport) {
		if !path.exists() {
			tracing::warn!(path = %path.display(), "file not found, skipping");
			report.skipped.push(SkippedFile {
				file: path.to_path_buf(),
				reason: "file not found".into(),
			});
			return;
		}

		match classify(path) {
			Ok(MediaKind::Image) => {
				tracing::info!(path = %path.display(), "processing image");
				report.images.push(ImageRecord {
					file: path.to_path_buf(),
					outcome: Outcome::from_result(self.images.analyze(path)),
				});
			}
			Ok(MediaKind::Video) => {
				tracing::info!(path = %path.display(), "processing video");
				let outcome = Outcome::from_result(self.videos.analyze(path));
				let first_frame_image = match &outcome {
					Outcome::Analyzed(features) => self.save_snapshot(path, features),
					Outcome::Failed { .. } => None,
				};
				report.videos.push(VideoRecord {
					file: path.to_path_buf(),
					outcome,
					first_frame_image,
				});
			}
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "skipping");
				report.skipped.push(SkippedFile {
					file: path.to_path_buf(),
					reason: error.to_string(),
				});
			}
		}
	}

	fn save_snapshot(&self, path: &Path, features: &VideoFeatureSet) -> Option<PathBuf> {
		let dir = self.first_frame_dir.as_ref()?;
		let frame = features.first_frame.as_ref()?;
		let output = dir.join(first_frame_name(path));
		match crate::image_file::write_image(frame, &output) {
			Ok(()) => Some(output),
			Err(error) => {
				tracing::warn!(output = %output.display(), %error, "could not save first frame");
				None
			}
		}
	}
}

/// `<stem>_first_frame.jpg`.
#[must_use]
pub fn first_frame_name(path: &Path) -> String {
	let stem = path.file_stem().map_or_else(|| "video".into(), |s| s.to_string_lossy());
	format!("{stem}_first_frame.jpg")
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{GrayImage, Luma, Rgb, RgbImage};

	#[test]
	fn test_missing_image_sentinels() {
		let path = "/definitely/not/here.png";
		assert_eq!(image_dimensions(path), Dimensions::UNKNOWN);
		assert!(!is_image_grayscale(path));
		assert_eq!(image_average_brightness(path), -1.0);
		assert_eq!(image_channel_count(path), -1);
		assert_eq!(image_edge_count(path), -1);
		assert!(image_dominant_colors(path, 3).is_empty());
		assert_eq!(image_blur_score(path), -1.0);
		assert!(analyze_image(path).is_err());
	}

	#[test]
	fn test_missing_video_sentinels() {
		let path = "/definitely/not/here.mp4";
		assert_eq!(video_frame_count(path), -1);
		assert_eq!(video_fps(path), -1.0);
		assert_eq!(video_resolution(path), Dimensions::UNKNOWN);
		assert_eq!(video_duration(path), -1.0);
		assert!(!is_video_grayscale(path));
		assert!(video_dominant_colors(path).is_empty());
		assert!(video_first_frame(path).is_none());
		assert!(!save_first_frame_as_image(path, "/tmp/never.jpg"));
	}

	#[test]
	fn test_real_image_files() {
		let dir = tempfile::tempdir().unwrap();
		let black = dir.path().join("black.png");
		RgbImage::from_pixel(200, 100, Rgb([0, 0, 0])).save(&black).unwrap();
		let gray = dir.path().join("gray.png");
		GrayImage::from_pixel(10, 10, Luma([128])).save(&gray).unwrap();

		assert_eq!(image_dimensions(&black), Dimensions::new(200, 100));
		assert!(!is_image_grayscale(&black));
		assert_eq!(image_average_brightness(&black), 0.0);
		assert_eq!(image_edge_count(&black), 0);
		assert_eq!(image_blur_score(&black), 0.0);
		assert_eq!(image_aspect_ratio(&black), 2.0);

		assert!(is_image_grayscale(&gray));
		assert_eq!(image_channel_count(&gray), 1);
		assert_eq!(image_entropy(&gray), 0.0);
		assert_eq!(image_histogram(&gray).len(), 3);
	}

	#[test]
	fn test_pipeline_report() {
		let dir = tempfile::tempdir().unwrap();
		let image = dir.path().join("red.png");
		RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])).save(&image).unwrap();
		let text = dir.path().join("notes.txt");
		std::fs::write(&text, "hello").unwrap();
		let missing = dir.path().join("missing.jpg");

		let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
		let report = pipeline.run(&[image.clone(), text, missing]);

		assert_eq!(report.images.len(), 1);
		assert!(report.videos.is_empty());
		assert_eq!(report.skipped.len(), 2);
		let features = report.images[0].outcome.features().unwrap();
		assert_eq!(features.dominant_colors.len(), DEFAULT_CLUSTERS);

		let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
		assert_eq!(json["images"][0]["width"], 8);
		assert_eq!(json["images"][0]["file"], image.to_string_lossy().as_ref());
		assert!(json["videos"].as_array().unwrap().is_empty());
	}

	#[test]
	fn test_corrupt_image_is_recorded_as_failure() {
		let dir = tempfile::tempdir().unwrap();
		let broken = dir.path().join("broken.jpg");
		std::fs::write(&broken, b"not a jpeg").unwrap();

		let report = Pipeline::new(PipelineConfig::default()).unwrap().run(&[broken]);
		assert_eq!(report.failures(), 1);
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["images"][0]["width"], -1);
		assert_eq!(json["images"][0]["height"], -1);
		assert!(json["images"][0]["error"].is_string());
	}

	#[test]
	fn test_invalid_config_rejected() {
		let config = PipelineConfig {
			clusters: 0,
			..PipelineConfig::default()
		};
		assert!(matches!(Pipeline::new(config), Err(AnalysisError::InvalidConfig(_))));
	}

	#[test]
	fn test_first_frame_name() {
		assert_eq!(first_frame_name(Path::new("/a/b/holiday.mp4")), "holiday_first_frame.jpg");
	}
}
