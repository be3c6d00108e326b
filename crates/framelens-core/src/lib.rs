//! # Framelens Core
//!
//! Perceptual feature extraction for still images and sampled video frames.
//!
//! ## Architecture
//!
//! This crate is pure compute. Pixels arrive through the capability traits in
//! [`source`]; concrete decoders live in `framelens-perception`, and tests
//! substitute closures or [`InMemoryVideoLoader`].
//!
//! ```text
//! ImageLoader ──► ImageAnalyzer ──► color / edges / stats ──► ImageFeatureSet
//! VideoLoader ──► FrameSampler ──► VideoAnalyzer ──────────► VideoFeatureSet
//! ```
//!
//! ## Failure model
//!
//! Per-metric methods never fail. A load or decode error is logged at `warn`
//! and the metric returns its sentinel (`-1`, `-1.0`, `(-1, -1)`, `false`,
//! empty list or `None`). The `analyze` entry points return the error instead.
//!
//! ## Example
//!
//! ```
//! use framelens_core::{ChannelLayout, ImageAnalyzer, PixelBuffer, Result};
//! use std::path::Path;
//!
//! let loader = |_: &Path| -> Result<PixelBuffer> {
//!     Ok(PixelBuffer::filled(200, 100, ChannelLayout::Rgb, 0))
//! };
//! let analyzer = ImageAnalyzer::new(loader);
//! let features = analyzer.analyze("black.png").unwrap();
//! assert_eq!(features.edge_count, 0);
//! assert_eq!(features.aspect_ratio, 2.0);
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod cluster;
pub mod color;
pub mod edges;
pub mod error;
pub mod image_features;
pub mod media;
pub mod sampler;
pub mod scene;
pub mod source;
pub mod stats;
pub mod video_features;

// Re-exports for convenience
pub use buffer::{luma, ChannelLayout, ColorTriplet, Dimensions, PixelBuffer};
pub use cluster::{kmeans, Clustering, KMeansConfig};
pub use error::{AnalysisError, Result};
pub use image_features::{ImageAnalyzer, ImageFeatureSet, DEFAULT_CLUSTERS};
pub use media::{classify, is_image_file, is_video_file, MediaKind};
pub use sampler::{FrameSampler, Frames, SamplingPass, SamplingPolicy};
pub use scene::{detect_scene_changes, SceneConfig};
pub use source::{
	Clip, FrameStream, ImageLoader, ImageWriter, InMemoryStream, InMemoryVideoLoader, VideoLoader,
};
pub use video_features::{FrameSummary, VideoAnalyzer, VideoFeatureSet, VIDEO_CLUSTERS};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
