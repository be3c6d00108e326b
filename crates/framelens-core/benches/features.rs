//! Feature extraction benchmarks.
//!
//! Edge detection, blur scoring, k-means and a full video pass over
//! in-memory frames.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framelens_core::{
	color, edges, Clip, ChannelLayout, InMemoryVideoLoader, KMeansConfig, PixelBuffer,
	VideoAnalyzer,
};

fn checkerboard(width: u32, height: u32, block: u32) -> PixelBuffer {
	PixelBuffer::from_fn(width, height, ChannelLayout::Rgb, |x, y, _| {
		if (x / block + y / block) % 2 == 0 {
			255
		} else {
			0
		}
	})
}

fn gradient(width: u32, height: u32, offset: u8) -> PixelBuffer {
	PixelBuffer::from_fn(width, height, ChannelLayout::Rgb, |x, y, c| {
		((x * 255 / width) as u8)
			.wrapping_add((y % 7) as u8)
			.wrapping_add(offset)
			.wrapping_add(c as u8 * 40)
	})
}

fn bench_edges(c: &mut Criterion) {
	let mut group = c.benchmark_group("edges");
	for size in [128_u32, 256, 512] {
		let frame = checkerboard(size, size, 8);
		group.throughput(Throughput::Elements(u64::from(size * size)));
		group.bench_with_input(BenchmarkId::new("edge_count", size), &frame, |b, frame| {
			b.iter(|| edges::edge_count(black_box(frame)));
		});
		group.bench_with_input(BenchmarkId::new("blur_score", size), &frame, |b, frame| {
			b.iter(|| edges::blur_score(black_box(frame)));
		});
	}
	group.finish();
}

fn bench_dominant_colors(c: &mut Criterion) {
	let mut group = c.benchmark_group("dominant_colors");
	let config = KMeansConfig {
		seed: Some(42),
		..KMeansConfig::default()
	};
	let frame = gradient(160, 90, 0);
	for k in [3_usize, 5, 8] {
		group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
			b.iter(|| color::dominant_colors(black_box(&frame), k, &config));
		});
	}
	group.finish();
}

fn bench_video_pass(c: &mut Criterion) {
	let frames: Vec<PixelBuffer> = (0..60_u8)
		.map(|i| if i % 20 < 10 { gradient(160, 90, i) } else { checkerboard(160, 90, 4) })
		.collect();
	let loader = InMemoryVideoLoader::new().with_clip("bench.mp4", Clip::new(frames, 30.0));
	let analyzer = VideoAnalyzer::new(loader).with_clustering(KMeansConfig {
		seed: Some(42),
		..KMeansConfig::default()
	});

	let mut group = c.benchmark_group("video");
	group.sample_size(20);
	group.bench_function("motion_score", |b| b.iter(|| analyzer.motion_score(black_box("bench.mp4"))));
	group.bench_function("scene_changes", |b| b.iter(|| analyzer.scene_changes(black_box("bench.mp4"))));
	group.bench_function("analyze", |b| b.iter(|| analyzer.analyze(black_box("bench.mp4"))));
	group.finish();
}

criterion_group!(benches, bench_edges, bench_dominant_colors, bench_video_pass);
criterion_main!(benches);
