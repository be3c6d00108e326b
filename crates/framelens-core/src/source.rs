//! Frame Sources
//!
//! Capability traits through which the feature engines acquire pixels. The
//! engines never decode anything themselves: a concrete loader is injected at
//! construction, so tests substitute in-memory fakes for real codecs.
//!
//! A video is re-opened for every sampling pass. [`VideoLoader::open`] must
//! therefore hand out an independent stream positioned at the first frame on
//! each call.

use crate::buffer::{Dimensions, PixelBuffer};
use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Decodes a still image into a single buffer.
pub trait ImageLoader {
	/// Load the image at `path`.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the file cannot be opened or decoded.
	fn load(&self, path: &Path) -> Result<PixelBuffer>;
}

impl<F> ImageLoader for F
where
	F: Fn(&Path) -> Result<PixelBuffer>,
{
	fn load(&self, path: &Path) -> Result<PixelBuffer> {
		self(path)
	}
}

/// Opens videos as sequential frame streams.
pub trait VideoLoader {
	/// Stream type produced by [`Self::open`].
	type Stream: FrameStream;

	/// Open `path` and position a new stream before its first frame.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the container cannot be opened.
	fn open(&self, path: &Path) -> Result<Self::Stream>;
}

/// An opened video.
pub trait FrameStream {
	/// Frame count reported by the container (may be an estimate).
	fn frame_count(&self) -> u64;

	/// Nominal frames per second; zero or negative when unknown.
	fn fps(&self) -> f64;

	/// Frame geometry reported by the container.
	fn resolution(&self) -> Dimensions;

	/// Decode the next frame, or `None` once the stream is exhausted.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when decoding fails mid-stream.
	fn read_frame(&mut self) -> Result<Option<PixelBuffer>>;

	/// Presentation timestamps in seconds for up to `limit` leading frames,
	/// if the container exposes them.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the timestamps cannot be read.
	fn timestamps(&mut self, limit: usize) -> Result<Option<Vec<f64>>> {
		let _ = limit;
		Ok(None)
	}
}

/// Encodes a buffer to an image file.
pub trait ImageWriter {
	/// Write `buffer` to `path`; the format follows the extension.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when encoding or writing fails.
	fn write(&self, buffer: &PixelBuffer, path: &Path) -> Result<()>;
}

/// A pre-decoded clip.
#[derive(Clone, Debug, Default)]
pub struct Clip {
	/// Frames in presentation order
	pub frames: Vec<PixelBuffer>,
	/// Nominal frame rate
	pub fps: f64,
	/// Optional presentation timestamps in seconds
	pub timestamps: Option<Vec<f64>>,
}

impl Clip {
	/// A clip with nominal timing only.
	#[must_use]
	pub const fn new(frames: Vec<PixelBuffer>, fps: f64) -> Self {
		Self {
			frames,
			fps,
			timestamps: None,
		}
	}

	/// Attach presentation timestamps.
	#[must_use]
	pub fn with_timestamps(mut self, timestamps: Vec<f64>) -> Self {
		self.timestamps = Some(timestamps);
		self
	}
}

/// [`VideoLoader`] over clips held in memory, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct InMemoryVideoLoader {
	clips: HashMap<PathBuf, Clip>,
}

impl InMemoryVideoLoader {
	/// An empty loader; every path fails to open.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `clip` under `path`, replacing any earlier clip.
	pub fn insert(&mut self, path: impl Into<PathBuf>, clip: Clip) {
		let _ = self.clips.insert(path.into(), clip);
	}

	/// Builder form of [`Self::insert`].
	#[must_use]
	pub fn with_clip(mut self, path: impl Into<PathBuf>, clip: Clip) -> Self {
		self.insert(path, clip);
		self
	}
}

impl VideoLoader for InMemoryVideoLoader {
	type Stream = InMemoryStream;

	fn open(&self, path: &Path) -> Result<Self::Stream> {
		let clip = self
			.clips
			.get(path)
			.ok_or_else(|| AnalysisError::load(path, "no such clip"))?;
		Ok(InMemoryStream {
			clip: clip.clone(),
			position: 0,
		})
	}
}

/// Stream handed out by [`InMemoryVideoLoader`].
#[derive(Clone, Debug)]
pub struct InMemoryStream {
	clip: Clip,
	position: usize,
}

impl FrameStream for InMemoryStream {
	fn frame_count(&self) -> u64 {
		self.clip.frames.len() as u64
	}

	fn fps(&self) -> f64 {
		self.clip.fps
	}

	fn resolution(&self) -> Dimensions {
		self.clip
			.frames
			.first()
			.map_or(Dimensions::UNKNOWN, PixelBuffer::dimensions)
	}

	fn read_frame(&mut self) -> Result<Option<PixelBuffer>> {
		let frame = self.clip.frames.get(self.position).cloned();
		if frame.is_some() {
			self.position += 1;
		}
		Ok(frame)
	}

	fn timestamps(&mut self, limit: usize) -> Result<Option<Vec<f64>>> {
		Ok(self
			.clip
			.timestamps
			.as_ref()
			.map(|stamps| stamps.iter().copied().take(limit).collect()))
	}
}
