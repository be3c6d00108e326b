//! Pixel Buffers
//!
//! A decoded frame: a `width × height` grid of 8-bit samples with either one
//! (grayscale) or three (R, G, B) interleaved channels. Channel order is R, G, B
//! everywhere in the pipeline; every [`ColorTriplet`] uses the same order.
//!
//! A zero-sized buffer means "not loaded" and is rejected by every analyzer.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// A color in R, G, B order, each component in `[0, 255]`.
pub type ColorTriplet = [f64; 3];

/// Rec. 601 luma weights in Q14 fixed point (sum = 16384).
const LUMA_RED: u32 = 4899;
const LUMA_GREEN: u32 = 9617;
const LUMA_BLUE: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Interleaved channel arrangement of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
	/// Single intensity channel.
	Gray,
	/// Red, green, blue.
	#[default]
	Rgb,
}

impl ChannelLayout {
	/// Number of interleaved samples per pixel.
	#[must_use]
	pub const fn channels(self) -> usize {
		match self {
			Self::Gray => 1,
			Self::Rgb => 3,
		}
	}

	/// Layout for a channel count, if supported.
	#[must_use]
	pub const fn from_channels(channels: usize) -> Option<Self> {
		match channels {
			1 => Some(Self::Gray),
			3 => Some(Self::Rgb),
			_ => None,
		}
	}
}

/// Width and height of a frame; `(-1, -1)` means "could not determine".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
	/// Width in pixels, or `-1`
	pub width: i32,
	/// Height in pixels, or `-1`
	pub height: i32,
}

impl Dimensions {
	/// Sentinel for a failed load. Never a valid geometry.
	pub const UNKNOWN: Self = Self {
		width: -1,
		height: -1,
	};

	/// Dimensions from unsigned pixel counts, saturating at `i32::MAX`.
	#[must_use]
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width: i32::try_from(width).unwrap_or(i32::MAX),
			height: i32::try_from(height).unwrap_or(i32::MAX),
		}
	}

	/// Whether these are real dimensions rather than the sentinel.
	#[must_use]
	pub const fn is_known(self) -> bool {
		self.width > 0 && self.height > 0
	}

	/// `width / height`, if known.
	#[must_use]
	pub fn aspect_ratio(self) -> Option<f64> {
		self.is_known()
			.then(|| f64::from(self.width) / f64::from(self.height))
	}
}

impl From<(i32, i32)> for Dimensions {
	fn from((width, height): (i32, i32)) -> Self {
		Self { width, height }
	}
}

/// An owned 8-bit frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
	width: u32,
	height: u32,
	layout: ChannelLayout,
	data: Vec<u8>,
}

impl PixelBuffer {
	/// Wrap interleaved samples.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::InvalidBuffer`] if `data.len()` differs from
	/// `width * height * layout.channels()`.
	pub fn new(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> Result<Self> {
		let expected = width as usize * height as usize * layout.channels();
		if data.len() != expected {
			return Err(AnalysisError::InvalidBuffer(format!(
				"{width}x{height} {layout:?} needs {expected} bytes, got {}",
				data.len()
			)));
		}
		Ok(Self {
			width,
			height,
			layout,
			data,
		})
	}

	/// The "not loaded" buffer.
	#[must_use]
	pub fn empty() -> Self {
		Self::default()
	}

	/// A buffer with every sample set to `value`.
	#[must_use]
	pub fn filled(width: u32, height: u32, layout: ChannelLayout, value: u8) -> Self {
		Self {
			width,
			height,
			layout,
			data: vec![value; width as usize * height as usize * layout.channels()],
		}
	}

	/// Build a buffer by evaluating `sample(x, y, channel)` for every sample.
	pub fn from_fn(
		width: u32,
		height: u32,
		layout: ChannelLayout,
		mut sample: impl FnMut(u32, u32, usize) -> u8,
	) -> Self {
		let channels = layout.channels();
		let mut data = Vec::with_capacity(width as usize * height as usize * channels);
		for y in 0..height {
			for x in 0..width {
				for channel in 0..channels {
					data.push(sample(x, y, channel));
				}
			}
		}
		Self {
			width,
			height,
			layout,
			data,
		}
	}

	/// Width in pixels.
	#[must_use]
	pub const fn width(&self) -> u32 {
		self.width
	}

	/// Height in pixels.
	#[must_use]
	pub const fn height(&self) -> u32 {
		self.height
	}

	/// Channel arrangement.
	#[must_use]
	pub const fn layout(&self) -> ChannelLayout {
		self.layout
	}

	/// Samples per pixel (1 or 3).
	#[must_use]
	pub const fn channels(&self) -> usize {
		self.layout.channels()
	}

	/// Interleaved samples, row-major.
	#[must_use]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Consume the buffer, returning its samples.
	#[must_use]
	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// `width * height`.
	#[must_use]
	pub const fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// Geometry as [`Dimensions`].
	#[must_use]
	pub fn dimensions(&self) -> Dimensions {
		Dimensions::new(self.width, self.height)
	}

	/// `(width, height, channels)`, used when comparing frames.
	#[must_use]
	pub const fn shape(&self) -> (u32, u32, usize) {
		(self.width, self.height, self.layout.channels())
	}

	/// True for the "not loaded" buffer.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0 || self.data.is_empty()
	}

	/// Fail with [`AnalysisError::EmptyBuffer`] on a zero-sized buffer.
	///
	/// # Errors
	///
	/// Returns [`AnalysisError::EmptyBuffer`] when [`Self::is_empty`] holds.
	pub fn ensure_loaded(&self) -> Result<()> {
		if self.is_empty() {
			return Err(AnalysisError::EmptyBuffer);
		}
		Ok(())
	}

	/// Iterate over pixels as channel slices.
	pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
		self.data.chunks_exact(self.channels())
	}

	/// Pixels as color observations; gray samples are lifted to `[v, v, v]`.
	pub fn observations(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
		self.pixels().map(|pixel| match *pixel {
			[r, g, b] => [r, g, b],
			[v] => [v, v, v],
			_ => [0, 0, 0],
		})
	}

	/// Single-channel luma view. Gray buffers are returned unchanged.
	#[must_use]
	pub fn to_grayscale(&self) -> Self {
		match self.layout {
			ChannelLayout::Gray => self.clone(),
			ChannelLayout::Rgb => Self {
				width: self.width,
				height: self.height,
				layout: ChannelLayout::Gray,
				data: self.pixels().map(|px| luma(px[0], px[1], px[2])).collect(),
			},
		}
	}
}

/// Rec. 601 luma, rounded to the nearest integer.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn luma(red: u8, green: u8, blue: u8) -> u8 {
	let weighted = u32::from(red) * LUMA_RED
		+ u32::from(green) * LUMA_GREEN
		+ u32::from(blue) * LUMA_BLUE
		+ (1 << (LUMA_SHIFT - 1));
	// Weights sum to 1 << LUMA_SHIFT, so the result fits in a byte.
	(weighted >> LUMA_SHIFT) as u8
}
