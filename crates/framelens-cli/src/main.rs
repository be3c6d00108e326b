//! framelens command-line tool.
//!
//! Classifies each input by extension, extracts image or video features and
//! writes one document with `images` and `videos` arrays.

mod report;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use framelens_core::{KMeansConfig, SamplingPolicy};
use framelens_perception::{AnalysisReport, Pipeline, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Rendering of the final report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
	/// One JSON document
	#[default]
	Json,
	/// Human-readable summary
	Text,
}

/// Command-line arguments for framelens.
#[derive(Parser, Debug)]
#[command(name = "framelens")]
#[command(version)]
#[command(about = "Extract perceptual feature fingerprints from images and videos")]
#[command(long_about = "framelens measures geometry, color statistics, sharpness, edge density, \
    dominant colors and entropy of still images, plus motion, scene changes, frame-rate \
    stability and color consistency of videos.\n\n\
    EXAMPLES:\n    \
    framelens photo.jpg clip.mp4\n    \
    framelens *.png --output results.json\n    \
    framelens clip.mp4 --format text --first-frame-dir frames/\n    \
    framelens long.mkv --max-motion-frames 200 --verbose")]
struct Args {
	/// Image or video files to analyze
	#[arg(required = true)]
	files: Vec<PathBuf>,

	/// Write the report here instead of standard output
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Report format
	#[arg(short, long, value_enum, default_value_t = Format::Json)]
	format: Format,

	/// Dominant colors per image
	#[arg(short = 'k', long, default_value_t = framelens_core::DEFAULT_CLUSTERS)]
	clusters: usize,

	/// Fixed k-means seed for reproducible colors
	#[arg(long)]
	seed: Option<u64>,

	/// Save `<stem>_first_frame.jpg` for each video into this directory
	#[arg(long)]
	first_frame_dir: Option<PathBuf>,

	/// JSON file holding a sampling policy
	#[arg(long)]
	config: Option<PathBuf>,

	/// Frames averaged for video brightness
	#[arg(long)]
	max_brightness_frames: Option<usize>,

	/// Frames differenced for the motion score
	#[arg(long)]
	max_motion_frames: Option<usize>,

	/// Frames pooled for video dominant colors
	#[arg(long)]
	max_color_sample_frames: Option<usize>,

	/// Frames scanned for scene changes
	#[arg(long)]
	max_scene_change_frames: Option<usize>,

	/// Debug logging
	#[arg(short, long, conflicts_with = "quiet")]
	verbose: bool,

	/// No logging
	#[arg(short, long, conflicts_with = "verbose")]
	quiet: bool,
}

impl Args {
	/// Sampling policy from `--config`, then individual flag overrides.
	fn sampling_policy(&self) -> anyhow::Result<SamplingPolicy> {
		let mut policy = match &self.config {
			Some(path) => load_policy(path)?,
			None => SamplingPolicy::default(),
		};
		let overrides = [
			(&mut policy.max_brightness_frames, self.max_brightness_frames),
			(&mut policy.max_motion_frames, self.max_motion_frames),
			(&mut policy.max_color_sample_frames, self.max_color_sample_frames),
			(&mut policy.max_scene_change_frames, self.max_scene_change_frames),
		];
		for (cap, value) in overrides {
			if let Some(value) = value {
				*cap = value;
			}
		}
		Ok(policy)
	}

	fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
		Ok(PipelineConfig {
			sampling: self.sampling_policy()?,
			clusters: self.clusters,
			clustering: KMeansConfig {
				seed: self.seed,
				..KMeansConfig::default()
			},
			first_frame_dir: self.first_frame_dir.clone(),
			..PipelineConfig::default()
		})
	}
}

fn load_policy(path: &Path) -> anyhow::Result<SamplingPolicy> {
	let text = fs::read_to_string(path)
		.with_context(|| format!("failed to read config {}", path.display()))?;
	serde_json::from_str(&text).with_context(|| format!("invalid sampling policy in {}", path.display()))
}

fn init_logging(args: &Args) {
	if args.quiet {
		return;
	}
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if args.verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.with_target(false)
		.with_writer(std::io::stderr)
		.finish();
	let _ = tracing::subscriber::set_global_default(subscriber);
}

fn render(report: &AnalysisReport, format: Format) -> anyhow::Result<String> {
	Ok(match format {
		Format::Json => report.to_json().context("failed to serialize report")?,
		Format::Text => report::render_text(report),
	})
}

fn run(args: &Args) -> anyhow::Result<AnalysisReport> {
	let config = args.pipeline_config()?;
	let pipeline = Pipeline::new(config).context("invalid configuration")?;

	if let Some(dir) = &args.first_frame_dir {
		fs::create_dir_all(dir)
			.with_context(|| format!("failed to create {}", dir.display()))?;
	}

	let report = pipeline.run(&args.files);
	let rendered = render(&report, args.format)?;
	match &args.output {
		Some(path) => {
			fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
			tracing::info!(path = %path.display(), "results saved");
		}
		None => println!("{rendered}"),
	}
	Ok(report)
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	init_logging(&args);
	let _ = run(&args)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{Rgb, RgbImage};

	#[test]
	fn test_defaults() {
		let args = Args::try_parse_from(["framelens", "a.jpg"]).unwrap();
		assert_eq!(args.format, Format::Json);
		assert_eq!(args.clusters, 3);
		assert_eq!(args.sampling_policy().unwrap(), SamplingPolicy::default());
	}

	#[test]
	fn test_files_required() {
		assert!(Args::try_parse_from(["framelens"]).is_err());
	}

	#[test]
	fn test_verbose_conflicts_with_quiet() {
		assert!(Args::try_parse_from(["framelens", "a.jpg", "-v", "-q"]).is_err());
	}

	#[test]
	fn test_flags_override_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let config = dir.path().join("policy.json");
		fs::write(&config, r#"{"max_brightness_frames": 20, "max_motion_frames": 30}"#).unwrap();

		let args = Args::try_parse_from([
			"framelens",
			"a.mp4",
			"--config",
			config.to_str().unwrap(),
			"--max-motion-frames",
			"7",
		])
		.unwrap();
		let policy = args.sampling_policy().unwrap();
		assert_eq!(policy.max_brightness_frames, 20);
		assert_eq!(policy.max_motion_frames, 7);
		assert_eq!(policy.max_color_sample_frames, 10);
	}

	#[test]
	fn test_zero_cap_is_rejected() {
		let args = Args::try_parse_from(["framelens", "a.mp4", "--max-color-sample-frames", "0", "-q"]).unwrap();
		assert!(run(&args).is_err());
	}

	#[test]
	fn test_writes_json_report() {
		let dir = tempfile::tempdir().unwrap();
		let image = dir.path().join("blue.png");
		RgbImage::from_pixel(12, 6, Rgb([0, 0, 255])).save(&image).unwrap();
		let output = dir.path().join("results.json");

		let args = Args::try_parse_from([
			"framelens",
			image.to_str().unwrap(),
			"missing.mov",
			"--output",
			output.to_str().unwrap(),
			"--seed",
			"1",
			"-q",
		])
		.unwrap();
		let report = run(&args).unwrap();
		assert_eq!(report.images.len(), 1);
		assert_eq!(report.skipped.len(), 1);

		let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
		assert_eq!(json["images"][0]["width"], 12);
		assert_eq!(json["images"][0]["aspect_ratio"], 2.0);
		assert!(json["videos"].as_array().unwrap().is_empty());
	}

	#[test]
	fn test_unwritable_output_fails() {
		let args = Args::try_parse_from([
			"framelens",
			"nothing.png",
			"--output",
			"/definitely/not/a/dir/results.json",
			"-q",
		])
		.unwrap();
		assert!(run(&args).is_err());
	}
}
