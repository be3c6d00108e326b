//! Video decoding against real files rendered by `ffmpeg`.
//!
//! Every test returns early when `ffmpeg` or `ffprobe` is not installed.

use framelens_core::{Dimensions, FrameStream, VideoLoader};
use framelens_perception::{
	analyze_video, check_ffmpeg, check_ffprobe, get_video_metadata, is_video_grayscale,
	save_first_frame_as_image, video_average_brightness, video_dominant_colors, video_duration,
	video_fps, video_frame_count, video_frame_rate_stability, video_motion_score,
	video_resolution, video_scene_changes, FfmpegVideoLoader, Pipeline, PipelineConfig,
	VideoConfig,
};
use std::path::{Path, PathBuf};
use std::process::Command;

fn tools_available() -> bool {
	let available = check_ffmpeg() && check_ffprobe();
	if !available {
		eprintln!("ffmpeg/ffprobe not installed, skipping");
	}
	available
}

/// Render a lavfi source to `name` inside `dir`.
fn render(dir: &Path, name: &str, source: &str, extra: &[&str]) -> PathBuf {
	let output = dir.join(name);
	let status = Command::new("ffmpeg")
		.args(["-v", "error", "-y", "-f", "lavfi", "-i", source])
		.args(extra)
		.args(["-c:v", "mpeg4", "-q:v", "2"])
		.arg(&output)
		.status()
		.unwrap();
	assert!(status.success(), "ffmpeg could not render {source}");
	output
}

/// 320x176, 25 fps, 250 frames of solid color.
fn solid_clip(dir: &Path) -> PathBuf {
	render(dir, "solid.mp4", "color=c=0x204060:s=320x176:r=25:d=10", &["-pix_fmt", "yuv420p"])
}

#[test]
fn test_metadata_of_ten_second_clip() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = solid_clip(dir.path());

	let metadata = get_video_metadata(&clip, &VideoConfig::default()).unwrap();
	assert_eq!((metadata.width, metadata.height), (320, 176));
	assert_eq!(metadata.fps, 25.0);

	assert_eq!(video_frame_count(&clip), 250);
	assert_eq!(video_fps(&clip), 25.0);
	assert_eq!(video_resolution(&clip), Dimensions::new(320, 176));
	assert_eq!(video_duration(&clip), 10.0);
}

#[test]
fn test_frames_stream_in_rgb() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = solid_clip(dir.path());

	let mut stream = FfmpegVideoLoader::default().open(&clip).unwrap();
	let frame = stream.read_frame().unwrap().unwrap();
	assert_eq!(frame.shape(), (320, 176, 3));
	// 0x204060 survives lossy coding within a few levels
	let [r, g, b] = [frame.data()[0], frame.data()[1], frame.data()[2]];
	assert!(r < g && g < b, "unexpected color {r},{g},{b}");

	let mut count = 1;
	while stream.read_frame().unwrap().is_some() {
		count += 1;
	}
	assert_eq!(count, 250);
}

#[test]
fn test_static_clip_metrics() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = solid_clip(dir.path());

	assert!(!is_video_grayscale(&clip));
	let brightness = video_average_brightness(&clip);
	assert!((brightness - f64::from(0x40)).abs() < 6.0, "brightness {brightness}");
	assert!(video_motion_score(&clip) < 1.0);
	assert_eq!(video_dominant_colors(&clip).len(), 3);
	assert_eq!(video_scene_changes(&clip), Some(Vec::new()));
	assert!(video_frame_rate_stability(&clip) < 0.01);
}

#[test]
fn test_hard_cut_is_detected() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = render(
		dir.path(),
		"cut.mp4",
		"color=c=black:s=64x64:r=10:d=2",
		&["-vf", "drawbox=c=white:t=fill:enable='gte(n,10)'", "-pix_fmt", "yuv420p"],
	);
	let changes = video_scene_changes(&clip).unwrap();
	assert_eq!(changes.first(), Some(&10));
	assert!(video_motion_score(&clip) > 0.0);
}

#[test]
fn test_first_frame_snapshot() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = solid_clip(dir.path());
	let snapshot = dir.path().join("first.jpg");

	assert!(save_first_frame_as_image(&clip, &snapshot));
	let image = image::open(&snapshot).unwrap();
	assert_eq!((image.width(), image.height()), (320, 176));

	let features = analyze_video(&clip).unwrap();
	assert_eq!(features.first_frame.unwrap().shape(), (320, 176, 3));
}

#[test]
fn test_pipeline_saves_snapshots() {
	if !tools_available() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let clip = solid_clip(dir.path());
	let frames = dir.path().join("frames");
	std::fs::create_dir(&frames).unwrap();

	let pipeline = Pipeline::new(PipelineConfig {
		first_frame_dir: Some(frames.clone()),
		..PipelineConfig::default()
	})
	.unwrap();
	let report = pipeline.run(&[clip]);

	assert_eq!(report.videos.len(), 1);
	let saved = report.videos[0].first_frame_image.clone().unwrap();
	assert_eq!(saved, frames.join("solid_first_frame.jpg"));
	assert!(saved.exists());
}
