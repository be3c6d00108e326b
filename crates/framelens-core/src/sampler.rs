//! Frame Sampler
//!
//! Bounded sequential reads from a video. Every pass opens its own stream
//! and reads from the first frame until its cap is hit or the stream ends,
//! so no cursor is shared between metrics.

use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::source::{FrameStream, VideoLoader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-metric ceilings on decoded frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
	/// Frames averaged for brightness
	pub max_brightness_frames: usize,
	/// Frames differenced for the motion score
	pub max_motion_frames: usize,
	/// Frames pooled for dominant colors
	pub max_color_sample_frames: usize,
	/// Frames scanned for scene changes
	pub max_scene_change_frames: usize,
	/// Frames whose mean colors feed color consistency
	pub max_consistency_frames: usize,
	/// Timestamps read for frame-rate stability
	pub max_timing_frames: usize,
}

impl Default for SamplingPolicy {
	fn default() -> Self {
		Self {
			max_brightness_frames: 100,
			max_motion_frames: 50,
			max_color_sample_frames: 10,
			max_scene_change_frames: 300,
			max_consistency_frames: 100,
			max_timing_frames: 300,
		}
	}
}

impl SamplingPolicy {
	/// Cap for one pass.
	#[must_use]
	pub const fn cap(&self, pass: SamplingPass) -> usize {
		match pass {
			SamplingPass::Brightness => self.max_brightness_frames,
			SamplingPass::Motion => self.max_motion_frames,
			SamplingPass::Color => self.max_color_sample_frames,
			SamplingPass::SceneChange => self.max_scene_change_frames,
			SamplingPass::Consistency => self.max_consistency_frames,
			SamplingPass::Timing => self.max_timing_frames,
		}
	}

	/// Reject zero caps.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::InvalidConfig`] naming the first zero cap.
	pub fn validate(&self) -> Result<()> {
		for pass in SamplingPass::ALL {
			if self.cap(pass) == 0 {
				return Err(AnalysisError::InvalidConfig(format!(
					"{pass} frame cap must be positive"
				)));
			}
		}
		Ok(())
	}
}

/// The independent reads a video analysis performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplingPass {
	/// Average brightness
	Brightness,
	/// Motion score
	Motion,
	/// Dominant colors
	Color,
	/// Scene-change detection
	SceneChange,
	/// Color consistency
	Consistency,
	/// Frame-rate stability
	Timing,
}

impl SamplingPass {
	/// Every pass, in declaration order.
	pub const ALL: [Self; 6] = [
		Self::Brightness,
		Self::Motion,
		Self::Color,
		Self::SceneChange,
		Self::Consistency,
		Self::Timing,
	];
}

impl fmt::Display for SamplingPass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Brightness => "brightness",
			Self::Motion => "motion",
			Self::Color => "color sample",
			Self::SceneChange => "scene change",
			Self::Consistency => "consistency",
			Self::Timing => "timing",
		};
		f.write_str(name)
	}
}

/// Opens bounded passes over a video.
#[derive(Clone, Copy, Debug)]
pub struct FrameSampler<'a, L> {
	loader: &'a L,
	policy: &'a SamplingPolicy,
}

impl<'a, L: VideoLoader> FrameSampler<'a, L> {
	/// Sampler over `loader` bounded by `policy`.
	#[must_use]
	pub const fn new(loader: &'a L, policy: &'a SamplingPolicy) -> Self {
		Self { loader, policy }
	}

	/// Open a fresh stream and iterate over at most `cap(pass)` frames.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the video cannot be opened.
	pub fn sample(&self, path: &Path, pass: SamplingPass) -> Result<Frames<L::Stream>> {
		let stream = self.loader.open(path)?;
		let cap = self.policy.cap(pass);
		tracing::debug!(path = %path.display(), %pass, cap, "opening sampling pass");
		Ok(Frames {
			stream,
			remaining: cap,
			read: 0,
			path: path.to_path_buf(),
		})
	}

	/// [`Self::sample`], collected in temporal order.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::Load`] when the video cannot be opened.
	pub fn collect(&self, path: &Path, pass: SamplingPass) -> Result<Vec<PixelBuffer>> {
		Ok(self.sample(path, pass)?.collect())
	}
}

/// Iterator over the frames of one sampling pass.
///
/// A decode error or an empty buffer ends the pass early.
#[derive(Debug)]
pub struct Frames<S> {
	stream: S,
	remaining: usize,
	read: usize,
	path: PathBuf,
}

impl<S: FrameStream> Frames<S> {
	/// The underlying stream, for metadata queries.
	pub const fn stream(&self) -> &S {
		&self.stream
	}

	/// Frames yielded so far.
	pub const fn read(&self) -> usize {
		self.read
	}
}

impl<S: FrameStream> Iterator for Frames<S> {
	type Item = PixelBuffer;

	fn next(&mut self) -> Option<Self::Item> {
		if self.remaining == 0 {
			return None;
		}
		match self.stream.read_frame() {
			Ok(Some(frame)) if !frame.is_empty() => {
				self.remaining -= 1;
				self.read += 1;
				Some(frame)
			}
			Ok(_) => {
				self.remaining = 0;
				None
			}
			Err(error) => {
				tracing::warn!(
					path = %self.path.display(),
					frame = self.read,
					%error,
					"decode failed, ending pass early"
				);
				self.remaining = 0;
				None
			}
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, Some(self.remaining))
	}
}
