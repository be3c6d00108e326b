//! Video decoding through the `FFmpeg` command-line tools.
//!
//! Metadata comes from `ffprobe` JSON. Frames are streamed from `ffmpeg` as
//! raw `rgb24` (or `gray` for grayscale sources) over a stdout pipe, one
//! `read_exact` per frame. The decoder process starts on the first
//! [`FrameStream::read_frame`] and is killed when the stream is dropped. A
//! decoder that exits non-zero at end of output surfaces its stderr as an error.

use crate::error::{PerceptionError, Result};
use framelens_core::{ChannelLayout, Dimensions, FrameStream, PixelBuffer, VideoLoader};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::thread::{self, JoinHandle};

/// Locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
	/// `ffmpeg` binary
	pub ffmpeg_path: PathBuf,
	/// `ffprobe` binary
	pub ffprobe_path: PathBuf,
}

impl Default for VideoConfig {
	fn default() -> Self {
		Self {
			ffmpeg_path: PathBuf::from("ffmpeg"),
			ffprobe_path: PathBuf::from("ffprobe"),
		}
	}
}

/// Stream properties reported by `ffprobe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
	/// Frame width in pixels
	pub width: u32,
	/// Frame height in pixels
	pub height: u32,
	/// Nominal frame rate, `0.0` when unknown
	pub fps: f64,
	/// Declared or estimated frame count, `0` when unknown
	pub frame_count: u64,
	/// Container duration in seconds, `0.0` when unknown
	pub duration: f64,
	/// Codec name, e.g. `h264`
	pub codec: Option<String>,
	/// Pixel format, e.g. `yuv420p`
	pub pixel_format: Option<String>,
}

impl VideoMetadata {
	/// Layout frames are decoded to; `gray*` pixel formats stay single-channel.
	#[must_use]
	pub fn layout(&self) -> ChannelLayout {
		match self.pixel_format.as_deref() {
			Some(format) if format.starts_with("gray") => ChannelLayout::Gray,
			_ => ChannelLayout::Rgb,
		}
	}

	/// Bytes in one decoded frame.
	#[must_use]
	pub fn frame_size(&self) -> usize {
		self.width as usize * self.height as usize * self.layout().channels()
	}
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
	#[serde(default)]
	streams: Vec<FfprobeStream>,
	#[serde(default)]
	format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
	#[serde(default)]
	codec_type: Option<String>,
	#[serde(default)]
	codec_name: Option<String>,
	#[serde(default)]
	width: Option<u32>,
	#[serde(default)]
	height: Option<u32>,
	#[serde(default)]
	pix_fmt: Option<String>,
	#[serde(default)]
	avg_frame_rate: Option<String>,
	#[serde(default)]
	r_frame_rate: Option<String>,
	#[serde(default)]
	nb_frames: Option<String>,
	#[serde(default)]
	duration: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FfprobeFormat {
	#[serde(default)]
	duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobePackets {
	#[serde(default)]
	packets: Vec<FfprobePacket>,
}

#[derive(Debug, Deserialize)]
struct FfprobePacket {
	#[serde(default)]
	pts_time: Option<String>,
}

impl VideoConfig {
	/// Whether the configured `ffmpeg` runs.
	#[must_use]
	pub fn ffmpeg_available(&self) -> bool {
		tool_available(&self.ffmpeg_path)
	}

	/// Whether the configured `ffprobe` runs.
	#[must_use]
	pub fn ffprobe_available(&self) -> bool {
		tool_available(&self.ffprobe_path)
	}
}

/// Whether `ffmpeg` is on `PATH`.
///
/// Use [`VideoConfig::ffmpeg_available`] when the binary lives elsewhere.
#[must_use]
pub fn check_ffmpeg() -> bool {
	VideoConfig::default().ffmpeg_available()
}

/// Whether `ffprobe` is on `PATH`.
///
/// Use [`VideoConfig::ffprobe_available`] when the binary lives elsewhere.
#[must_use]
pub fn check_ffprobe() -> bool {
	VideoConfig::default().ffprobe_available()
}

fn tool_available(tool: &Path) -> bool {
	Command::new(tool)
		.arg("-version")
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.is_ok_and(|status| status.success())
}

/// Parse an `ffprobe` rate such as `"30000/1001"` or `"25"`.
///
/// Zero denominators and non-positive rates yield `None`.
#[must_use]
pub fn parse_rate(rate: &str) -> Option<f64> {
	let value = match rate.split_once('/') {
		Some((numerator, denominator)) => {
			let numerator = numerator.trim().parse::<f64>().ok()?;
			let denominator = denominator.trim().parse::<f64>().ok()?;
			if denominator == 0.0 {
				return None;
			}
			numerator / denominator
		}
		None => rate.trim().parse::<f64>().ok()?,
	};
	(value.is_finite() && value > 0.0).then_some(value)
}

/// Probe stream geometry, rate, frame count and duration.
///
/// # Errors
///
/// Returns an error if `ffprobe` is missing, fails, or reports no video stream.
pub fn get_video_metadata(path: &Path, config: &VideoConfig) -> Result<VideoMetadata> {
	let output = run_tool(
		"ffprobe",
		Command::new(&config.ffprobe_path)
			.args(["-v", "error", "-select_streams", "v:0", "-show_entries"])
			.arg(
				"stream=codec_type,codec_name,width,height,pix_fmt,avg_frame_rate,\
				 r_frame_rate,nb_frames,duration:format=duration",
			)
			.args(["-of", "json"])
			.arg(path),
		path,
	)?;
	let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
	let metadata = metadata_from_probe(probe, path)?;
	tracing::debug!(
		path = %path.display(),
		width = metadata.width,
		height = metadata.height,
		fps = metadata.fps,
		frames = metadata.frame_count,
		"probed video"
	);
	Ok(metadata)
}

fn metadata_from_probe(probe: FfprobeOutput, path: &Path) -> Result<VideoMetadata> {
	let stream = probe
		.streams
		.into_iter()
		.find(|stream| stream.codec_type.as_deref().map_or(true, |kind| kind == "video"))
		.ok_or_else(|| PerceptionError::MissingVideoStream(path.to_path_buf()))?;

	let (width, height) = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
	if width == 0 || height == 0 {
		return Err(PerceptionError::InvalidGeometry { width, height });
	}

	let fps = stream
		.avg_frame_rate
		.as_deref()
		.and_then(parse_rate)
		.or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
		.unwrap_or(0.0);
	let duration = probe
		.format
		.duration
		.as_deref()
		.or(stream.duration.as_deref())
		.and_then(|value| value.trim().parse::<f64>().ok())
		.filter(|value| value.is_finite() && *value > 0.0)
		.unwrap_or(0.0);
	let frame_count = stream
		.nb_frames
		.as_deref()
		.and_then(|value| value.trim().parse::<u64>().ok())
		.filter(|&count| count > 0)
		.unwrap_or_else(|| estimate_frames(duration, fps));

	Ok(VideoMetadata {
		width,
		height,
		fps,
		frame_count,
		duration,
		codec: stream.codec_name,
		pixel_format: stream.pix_fmt,
	})
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimate_frames(duration: f64, fps: f64) -> u64 {
	if duration > 0.0 && fps > 0.0 {
		(duration * fps).round() as u64
	} else {
		0
	}
}

/// Presentation timestamps of the first `limit` video packets, ascending.
///
/// # Errors
///
/// Returns an error if `ffprobe` is missing or fails.
pub fn packet_timestamps(path: &Path, limit: usize, config: &VideoConfig) -> Result<Vec<f64>> {
	let output = run_tool(
		"ffprobe",
		Command::new(&config.ffprobe_path)
			.args(["-v", "error", "-select_streams", "v:0"])
			.args(["-show_entries", "packet=pts_time"])
			.arg("-read_intervals")
			.arg(format!("%+#{limit}"))
			.args(["-of", "json"])
			.arg(path),
		path,
	)?;
	let parsed: FfprobePackets = serde_json::from_slice(&output.stdout)?;
	let mut stamps: Vec<f64> = parsed
		.packets
		.iter()
		.filter_map(|packet| packet.pts_time.as_deref()?.trim().parse::<f64>().ok())
		.filter(|stamp| stamp.is_finite())
		.collect();
	stamps.sort_by(f64::total_cmp);
	stamps.truncate(limit);
	Ok(stamps)
}

fn run_tool(tool: &'static str, command: &mut Command, path: &Path) -> Result<Output> {
	let output = command.output().map_err(|error| match error.kind() {
		ErrorKind::NotFound => PerceptionError::ToolNotFound(tool.to_string()),
		_ => PerceptionError::Io(error),
	})?;
	if !output.status.success() {
		return Err(PerceptionError::ToolFailed {
			tool,
			path: path.to_path_buf(),
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		});
	}
	Ok(output)
}

/// [`VideoLoader`] that probes with `ffprobe` and decodes with `ffmpeg`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegVideoLoader {
	config: VideoConfig,
}

impl FfmpegVideoLoader {
	/// Loader using the given tool locations.
	#[must_use]
	pub const fn new(config: VideoConfig) -> Self {
		Self { config }
	}

	/// Tool locations in use.
	#[must_use]
	pub const fn config(&self) -> &VideoConfig {
		&self.config
	}
}

impl VideoLoader for FfmpegVideoLoader {
	type Stream = FfmpegFrameStream;

	fn open(&self, path: &Path) -> framelens_core::Result<Self::Stream> {
		if !path.is_file() {
			return Err(framelens_core::AnalysisError::load(path, "no such file"));
		}
		let metadata = get_video_metadata(path, &self.config).map_err(|error| error.into_load(path))?;
		Ok(FfmpegFrameStream {
			path: path.to_path_buf(),
			config: self.config.clone(),
			metadata,
			decoder: None,
			finished: false,
		})
	}
}

#[derive(Debug)]
struct Decoder {
	child: Child,
	reader: BufReader<ChildStdout>,
	/// Collects stderr so a chatty decoder never blocks on a full pipe
	stderr: Option<JoinHandle<String>>,
}

/// Sequential frames of one video.
#[derive(Debug)]
pub struct FfmpegFrameStream {
	path: PathBuf,
	config: VideoConfig,
	metadata: VideoMetadata,
	decoder: Option<Decoder>,
	finished: bool,
}

impl FfmpegFrameStream {
	/// Probed stream properties.
	#[must_use]
	pub const fn metadata(&self) -> &VideoMetadata {
		&self.metadata
	}

	fn spawn_decoder(&self) -> Result<Decoder> {
		let pixel_format = match self.metadata.layout() {
			ChannelLayout::Gray => "gray",
			ChannelLayout::Rgb => "rgb24",
		};
		let mut child = Command::new(&self.config.ffmpeg_path)
			.args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
			.arg(&self.path)
			.args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", pixel_format, "pipe:1"])
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|error| match error.kind() {
				ErrorKind::NotFound => PerceptionError::ToolNotFound("ffmpeg".to_string()),
				_ => PerceptionError::Io(error),
			})?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| PerceptionError::Io(std::io::Error::other("ffmpeg stdout not captured")))?;
		let stderr = child.stderr.take().map(|mut pipe| {
			thread::spawn(move || {
				let mut text = String::new();
				let _ = pipe.read_to_string(&mut text);
				text
			})
		});
		tracing::debug!(path = %self.path.display(), pixel_format, "spawned decoder");
		Ok(Decoder {
			child,
			reader: BufReader::new(stdout),
			stderr,
		})
	}

	fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
		if self.finished {
			return Ok(None);
		}
		if self.decoder.is_none() {
			self.decoder = Some(self.spawn_decoder()?);
		}
		let layout = self.metadata.layout();
		let mut data = vec![0_u8; self.metadata.frame_size()];
		let Some(decoder) = self.decoder.as_mut() else {
			return Ok(None);
		};

		match decoder.reader.read_exact(&mut data) {
			Ok(()) => Ok(Some(PixelBuffer::new(
				self.metadata.width,
				self.metadata.height,
				layout,
				data,
			)?)),
			Err(error) if error.kind() == ErrorKind::UnexpectedEof => {
				self.drain()?;
				Ok(None)
			}
			Err(error) => {
				self.finish();
				Err(error.into())
			}
		}
	}

	/// Reap a decoder whose stdout hit EOF; a non-zero exit is a decode failure.
	fn drain(&mut self) -> Result<()> {
		self.finished = true;
		let Some(mut decoder) = self.decoder.take() else {
			return Ok(());
		};
		let status = decoder.child.wait()?;
		let stderr = decoder
			.stderr
			.take()
			.and_then(|collector| collector.join().ok())
			.unwrap_or_default();
		if status.success() {
			return Ok(());
		}
		let stderr = stderr.trim().to_string();
		tracing::warn!(path = %self.path.display(), %status, stderr = %stderr, "decoder exited early");
		Err(PerceptionError::ToolFailed {
			tool: "ffmpeg",
			path: self.path.clone(),
			stderr,
		})
	}

	fn finish(&mut self) {
		self.finished = true;
		if let Some(mut decoder) = self.decoder.take() {
			// Exit status is irrelevant once the pipe is drained or abandoned
			let _ = decoder.child.kill();
			let _ = decoder.child.wait();
		}
	}
}

impl FrameStream for FfmpegFrameStream {
	fn frame_count(&self) -> u64 {
		self.metadata.frame_count
	}

	fn fps(&self) -> f64 {
		self.metadata.fps
	}

	fn resolution(&self) -> Dimensions {
		Dimensions::new(self.metadata.width, self.metadata.height)
	}

	fn read_frame(&mut self) -> framelens_core::Result<Option<PixelBuffer>> {
		let path = self.path.clone();
		self.next_frame().map_err(|error| error.into_load(&path))
	}

	fn timestamps(&mut self, limit: usize) -> framelens_core::Result<Option<Vec<f64>>> {
		let stamps = packet_timestamps(&self.path, limit, &self.config)
			.map_err(|error| error.into_load(&self.path))?;
		Ok((!stamps.is_empty()).then_some(stamps))
	}
}

impl Drop for FfmpegFrameStream {
	fn drop(&mut self) {
		self.finish();
	}
}
