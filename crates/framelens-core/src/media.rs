//! Media classification by file extension.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions decoded as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif", "webp"];

/// Extensions decoded as video.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Kind of media a path names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
	/// Still image
	Image,
	/// Video container
	Video,
}

/// Whether `path` has a still-image extension (case-insensitive).
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
	has_extension(path.as_ref(), IMAGE_EXTENSIONS)
}

/// Whether `path` has a video extension (case-insensitive).
pub fn is_video_file(path: impl AsRef<Path>) -> bool {
	has_extension(path.as_ref(), VIDEO_EXTENSIONS)
}

/// Classify `path` by extension.
///
/// # Errors
///
/// Returns [`AnalysisError::UnsupportedFormat`] for any other extension.
pub fn classify(path: impl AsRef<Path>) -> Result<MediaKind> {
	let path = path.as_ref();
	if is_image_file(path) {
		Ok(MediaKind::Image)
	} else if is_video_file(path) {
		Ok(MediaKind::Video)
	} else {
		Err(AnalysisError::UnsupportedFormat(path.display().to_string()))
	}
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext)))
}
