//! # Framelens Perception
//!
//! Concrete frame sources for framelens-core: still images through the
//! `image` crate and video through the `FFmpeg` command-line tools.
//!
//! ## Architecture
//!
//! The core engines are pure compute over injected loaders. This crate
//! supplies the loaders that touch the filesystem and external processes,
//! plus path-level convenience functions and a batch [`Pipeline`].
//!
//! ## Features
//!
//! - **Images**: [`ImageFileLoader`] decodes JPEG, PNG, BMP, TIFF, GIF and `WebP`
//! - **Video**: [`FfmpegVideoLoader`] probes with `ffprobe` and streams raw
//!   frames from `ffmpeg`
//! - **Per-metric functions**: one per metric, each returning its sentinel
//!   on failure
//! - **Pipeline**: classify, analyze and collect many files into an
//!   [`AnalysisReport`]
//!
//! ## Example
//!
//! ```no_run
//! use framelens_perception::{image_dimensions, video_duration};
//!
//! let dims = image_dimensions("photo.jpg");
//! if dims.width == -1 {
//!     eprintln!("could not load photo.jpg");
//! }
//! println!("clip lasts {:.1}s", video_duration("clip.mp4"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod image_file;
pub mod pipeline;
pub mod video;

// Re-exports for convenience
pub use error::{PerceptionError, Result};
pub use image_file::{read_image, to_buffer, write_image, ImageFileLoader, ImageFileWriter};
pub use pipeline::{
	analyze_image, analyze_video, first_frame_name, image_aspect_ratio, image_average_brightness,
	image_blur_score, image_channel_count, image_contrast_ratio, image_dimensions,
	image_dominant_colors, image_edge_count, image_entropy, image_histogram, image_saturation,
	is_image_grayscale, is_video_grayscale, save_first_frame_as_image, video_average_brightness,
	video_color_consistency, video_dominant_colors, video_duration, video_first_frame, video_fps,
	video_frame_count, video_frame_rate_stability, video_motion_score, video_resolution,
	video_scene_changes, AnalysisReport, ImageRecord, Outcome, Pipeline, PipelineConfig,
	SkippedFile, VideoRecord,
};
pub use video::{
	check_ffmpeg, check_ffprobe, get_video_metadata, packet_timestamps, parse_rate,
	FfmpegFrameStream, FfmpegVideoLoader, VideoConfig, VideoMetadata,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
