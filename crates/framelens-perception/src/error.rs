//! Error types for the decoding layer.

use framelens_core::AnalysisError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while decoding media from disk.
#[derive(Debug, Error)]
pub enum PerceptionError {
	/// Filesystem or pipe I/O failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The `image` crate could not decode or encode a file.
	#[error("image codec error: {0}")]
	Image(#[from] image::ImageError),

	/// ffprobe output was not the expected JSON.
	#[error("invalid ffprobe payload: {0}")]
	Json(#[from] serde_json::Error),

	/// A required external tool is not installed.
	#[error("{0} not found on PATH")]
	ToolNotFound(String),

	/// An external tool exited unsuccessfully.
	#[error("{tool} failed on {}: {stderr}", path.display())]
	ToolFailed {
		/// Tool name
		tool: &'static str,
		/// Input path
		path: PathBuf,
		/// Captured standard error
		stderr: String,
	},

	/// The container holds no video stream.
	#[error("no video stream in {}", .0.display())]
	MissingVideoStream(PathBuf),

	/// The decoder reported a geometry it cannot produce frames for.
	#[error("unusable video geometry {width}x{height}")]
	InvalidGeometry {
		/// Reported width
		width: u32,
		/// Reported height
		height: u32,
	},

	/// Pixel data rejected by the core buffer type.
	#[error(transparent)]
	Analysis(#[from] AnalysisError),
}

impl PerceptionError {
	/// Attach `path` and convert into the core load failure.
	pub fn into_load(self, path: &Path) -> AnalysisError {
		match self {
			Self::Analysis(error) => error,
			other => AnalysisError::load(path, other),
		}
	}
}

/// Result type for the decoding layer.
pub type Result<T> = std::result::Result<T, PerceptionError>;
