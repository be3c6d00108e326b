//! Error types for feature extraction.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while acquiring or analyzing pixel data.
#[derive(Debug, Error)]
pub enum AnalysisError {
	/// The source could not be opened or decoded.
	#[error("failed to load {}: {reason}", path.display())]
	Load {
		/// Path handed to the frame source.
		path: PathBuf,
		/// Decoder-provided reason.
		reason: String,
	},

	/// An operation was attempted on a zero-sized buffer or empty sequence.
	#[error("operation attempted on an empty buffer")]
	EmptyBuffer,

	/// The file extension is not on the image or video allow-list.
	#[error("unsupported media format: {0}")]
	UnsupportedFormat(String),

	/// Pixel data does not match the declared geometry.
	#[error("invalid pixel buffer: {0}")]
	InvalidBuffer(String),

	/// Two frames that must be compared have different geometry.
	#[error("frame geometry changed from {expected:?} to {actual:?}")]
	FrameMismatch {
		/// `(width, height, channels)` of the earlier frame.
		expected: (u32, u32, usize),
		/// `(width, height, channels)` of the later frame.
		actual: (u32, u32, usize),
	},

	/// The source reports no usable frame rate.
	#[error("frame rate unknown or non-positive")]
	UnknownFrameRate,

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

impl AnalysisError {
	/// Build a [`AnalysisError::Load`] from any displayable cause.
	pub fn load(path: &Path, reason: impl std::fmt::Display) -> Self {
		Self::Load {
			path: path.to_path_buf(),
			reason: reason.to_string(),
		}
	}
}

/// Result type for feature extraction.
pub type Result<T> = std::result::Result<T, AnalysisError>;
