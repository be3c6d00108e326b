//! End-to-end behaviour of the feature engines over in-memory sources.

use framelens_core::{
	AnalysisError, ChannelLayout, Clip, Dimensions, ImageAnalyzer, InMemoryVideoLoader,
	KMeansConfig, PixelBuffer, Result, SamplingPolicy, VideoAnalyzer,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Image "files" held in memory.
fn library(images: Vec<(&str, PixelBuffer)>) -> impl Fn(&Path) -> Result<PixelBuffer> {
	let images: HashMap<PathBuf, PixelBuffer> =
		images.into_iter().map(|(name, buffer)| (PathBuf::from(name), buffer)).collect();
	move |path: &Path| {
		images
			.get(path)
			.cloned()
			.ok_or_else(|| AnalysisError::load(path, "no such file"))
	}
}

fn seeded() -> KMeansConfig {
	KMeansConfig {
		seed: Some(11),
		..KMeansConfig::default()
	}
}

fn noisy(width: u32, height: u32, layout: ChannelLayout) -> PixelBuffer {
	let mut state = 0x2545_f491_u32;
	PixelBuffer::from_fn(width, height, layout, |_, _, _| {
		state ^= state << 13;
		state ^= state >> 17;
		state ^= state << 5;
		(state >> 24) as u8
	})
}

#[test]
fn test_black_color_image() {
	let analyzer = ImageAnalyzer::new(library(vec![(
		"black.png",
		PixelBuffer::filled(200, 100, ChannelLayout::Rgb, 0),
	)]));

	assert_eq!(analyzer.dimensions("black.png"), Dimensions::new(200, 100));
	assert!(!analyzer.is_grayscale("black.png"));
	assert_eq!(analyzer.average_brightness("black.png"), 0.0);
	assert_eq!(analyzer.edge_count("black.png"), 0);
	assert_eq!(analyzer.blur_score("black.png"), 0.0);
}

#[test]
fn test_flat_gray_image() {
	let analyzer = ImageAnalyzer::new(library(vec![(
		"gray.png",
		PixelBuffer::filled(10, 10, ChannelLayout::Gray, 128),
	)]));

	assert_eq!(analyzer.entropy("gray.png"), 0.0);
	assert!(analyzer.is_grayscale("gray.png"));
	assert_eq!(analyzer.channel_count("gray.png"), 1);
	assert_eq!(analyzer.blur_score("gray.png"), 0.0);
	assert_eq!(analyzer.average_brightness("gray.png"), 128.0);
}

#[test]
fn test_missing_image_yields_unknown_dimensions() {
	let analyzer = ImageAnalyzer::new(library(Vec::new()));
	assert_eq!(analyzer.dimensions("nowhere.jpg"), Dimensions::UNKNOWN);
	assert!(analyzer.analyze("nowhere.jpg").is_err());
}

#[test]
fn test_image_invariants_on_noise() {
	let analyzer = ImageAnalyzer::new(library(vec![
		("color.png", noisy(37, 23, ChannelLayout::Rgb)),
		("gray.png", noisy(31, 17, ChannelLayout::Gray)),
	]))
	.with_clustering(seeded());

	for name in ["color.png", "gray.png"] {
		let features = analyzer.analyze(name).unwrap();
		let pixels = u64::try_from(features.dimensions.width * features.dimensions.height).unwrap();

		assert_eq!(features.is_grayscale, features.channels == 1);
		assert!((0.0..=8.0).contains(&features.entropy));
		assert!(features.entropy > 0.0);
		assert_eq!(
			features.aspect_ratio,
			f64::from(features.dimensions.width) / f64::from(features.dimensions.height)
		);
		assert!(features.contrast_ratio > 1.0);
		assert!(features.blur_score > 0.0);
		assert_eq!(features.histogram.len(), 3);
		for channel in &features.histogram {
			assert_eq!(channel.iter().sum::<u64>(), pixels);
		}
		for k in 1..=6 {
			let colors = analyzer.dominant_colors(name, k);
			assert_eq!(colors.len(), k);
			assert!(colors.iter().flatten().all(|&v| (0.0..=255.0).contains(&v)));
		}
	}
}

#[test]
fn test_uniform_brightness_is_exact() {
	for value in [0_u8, 1, 77, 254, 255] {
		let analyzer = ImageAnalyzer::new(library(vec![(
			"flat.png",
			PixelBuffer::filled(9, 5, ChannelLayout::Rgb, value),
		)]));
		assert!((analyzer.average_brightness("flat.png") - f64::from(value)).abs() < 1e-12);
	}
}

#[test]
fn test_missing_video_sentinels() {
	let analyzer = VideoAnalyzer::new(InMemoryVideoLoader::new());
	assert_eq!(analyzer.frame_count("gone.mp4"), -1);
	assert_eq!(analyzer.fps("gone.mp4"), -1.0);
	assert_eq!(analyzer.resolution("gone.mp4"), Dimensions::UNKNOWN);
	assert_eq!(analyzer.duration("gone.mp4"), -1.0);
	assert!(!analyzer.is_grayscale("gone.mp4"));
	assert!(analyzer.dominant_colors("gone.mp4").is_empty());
}

#[test]
fn test_duration_of_ten_second_clip() {
	let frames = vec![PixelBuffer::filled(32, 18, ChannelLayout::Rgb, 10); 250];
	let analyzer = VideoAnalyzer::new(InMemoryVideoLoader::new().with_clip("ten.mp4", Clip::new(frames, 25.0)));
	assert_eq!(analyzer.frame_count("ten.mp4"), 250);
	assert_eq!(analyzer.fps("ten.mp4"), 25.0);
	assert_eq!(analyzer.duration("ten.mp4"), 10.0);
}

#[test]
fn test_video_temporal_invariants() {
	// Three scenes of drifting noise
	let mut frames = Vec::new();
	for scene in 0..3_u8 {
		for step in 0..8_u8 {
			let base = scene * 100;
			frames.push(PixelBuffer::from_fn(24, 16, ChannelLayout::Rgb, |x, y, c| {
				base.wrapping_add(((x + y) % 5) as u8)
					.wrapping_add(step)
					.wrapping_add(c as u8)
			}));
		}
	}
	let sampled = frames.len();
	let loader = InMemoryVideoLoader::new().with_clip("scenes.mp4", Clip::new(frames, 24.0));
	let analyzer = VideoAnalyzer::new(loader).with_clustering(seeded());

	let motion = analyzer.motion_score("scenes.mp4");
	assert!(motion >= 0.0);

	let consistency = analyzer.color_consistency("scenes.mp4");
	assert!((0.0..=1.0).contains(&consistency));

	let changes = analyzer.scene_changes("scenes.mp4").unwrap();
	assert!(changes.windows(2).all(|w| w[0] < w[1]));
	assert!(changes.iter().all(|&i| i < sampled));
	assert_eq!(changes, vec![8, 16]);
}

#[test]
fn test_caps_bound_every_pass() {
	let frames: Vec<PixelBuffer> = (0..200_u32)
		.map(|i| PixelBuffer::filled(4, 4, ChannelLayout::Gray, (i % 256) as u8))
		.collect();
	let loader = InMemoryVideoLoader::new().with_clip("long.mp4", Clip::new(frames, 30.0));
	let policy = SamplingPolicy {
		max_brightness_frames: 2,
		max_motion_frames: 3,
		max_scene_change_frames: 4,
		..SamplingPolicy::default()
	};
	let analyzer = VideoAnalyzer::new(loader).with_policy(policy);

	// Frames 0 and 1
	assert_eq!(analyzer.average_brightness("long.mp4"), 0.5);
	// Two pairs each differing by one level
	assert_eq!(analyzer.motion_score("long.mp4"), 1.0);
	assert!(analyzer.scene_changes("long.mp4").unwrap().iter().all(|&i| i < 4));
}
