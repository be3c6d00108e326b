//! Human-readable rendering of an analysis report.

use framelens_core::{ColorTriplet, ImageFeatureSet, VideoFeatureSet};
use framelens_perception::{AnalysisReport, Outcome};
use std::fmt::Write;

pub fn render_text(report: &AnalysisReport) -> String {
	let mut out = String::new();

	for record in &report.images {
		let _ = writeln!(out, "=== Image: {} ===", record.file.display());
		match &record.outcome {
			Outcome::Analyzed(features) => write_image(&mut out, features),
			Outcome::Failed { error, .. } => {
				let _ = writeln!(out, "  error: {error}");
			}
		}
		out.push('\n');
	}

	for record in &report.videos {
		let _ = writeln!(out, "=== Video: {} ===", record.file.display());
		match &record.outcome {
			Outcome::Analyzed(features) => write_video(&mut out, features),
			Outcome::Failed { error, .. } => {
				let _ = writeln!(out, "  error: {error}");
			}
		}
		if let Some(path) = &record.first_frame_image {
			let _ = writeln!(out, "  first frame:       {}", path.display());
		}
		out.push('\n');
	}

	for skipped in &report.skipped {
		let _ = writeln!(out, "skipped {}: {}", skipped.file.display(), skipped.reason);
	}
	let _ = write!(
		out,
		"{} image(s), {} video(s), {} failed, {} skipped",
		report.images.len(),
		report.videos.len(),
		report.failures(),
		report.skipped.len()
	);
	out
}

fn write_image(out: &mut String, f: &ImageFeatureSet) {
	let _ = writeln!(out, "  dimensions:        {}x{}", f.dimensions.width, f.dimensions.height);
	let _ = writeln!(out, "  channels:          {}", f.channels);
	let _ = writeln!(out, "  grayscale:         {}", yes_no(f.is_grayscale));
	let _ = writeln!(out, "  brightness:        {:.2}", f.average_brightness);
	let _ = writeln!(out, "  contrast ratio:    {:.2}", f.contrast_ratio);
	let _ = writeln!(out, "  saturation:        {:.2}", f.saturation);
	let _ = writeln!(out, "  aspect ratio:      {:.3}", f.aspect_ratio);
	let _ = writeln!(out, "  entropy:           {:.3} bits", f.entropy);
	let _ = writeln!(out, "  edge pixels:       {}", f.edge_count);
	let _ = writeln!(out, "  blur score:        {:.2}", f.blur_score);
	let _ = writeln!(out, "  dominant colors:   {}", colors(&f.dominant_colors));
}

fn write_video(out: &mut String, f: &VideoFeatureSet) {
	let _ = writeln!(out, "  resolution:        {}x{}", f.resolution.width, f.resolution.height);
	let _ = writeln!(out, "  frames:            {}", f.frame_count);
	let _ = writeln!(out, "  fps:               {:.3}", f.fps);
	let _ = writeln!(out, "  duration:          {:.2}s", f.duration);
	let _ = writeln!(out, "  grayscale:         {}", yes_no(f.is_grayscale));
	let _ = writeln!(out, "  brightness:        {:.2}", f.average_brightness);
	let _ = writeln!(out, "  motion score:      {:.3}", f.motion_score);
	match &f.scene_changes {
		Some(changes) => {
			let _ = writeln!(out, "  scene changes:     {changes:?}");
		}
		None => {
			let _ = writeln!(out, "  scene changes:     unavailable");
		}
	}
	let _ = writeln!(out, "  timing variance:   {:.4}", f.frame_rate_stability);
	let _ = writeln!(out, "  color consistency: {:.3}", f.color_consistency);
	let _ = writeln!(out, "  dominant colors:   {}", colors(&f.dominant_colors));
}

const fn yes_no(value: bool) -> &'static str {
	if value {
		"yes"
	} else {
		"no"
	}
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn colors(colors: &[ColorTriplet]) -> String {
	if colors.is_empty() {
		return "none".into();
	}
	colors
		.iter()
		.map(|[r, g, b]| {
			format!(
				"#{:02x}{:02x}{:02x}",
				r.round().clamp(0.0, 255.0) as u8,
				g.round().clamp(0.0, 255.0) as u8,
				b.round().clamp(0.0, 255.0) as u8
			)
		})
		.collect::<Vec<_>>()
		.join(" ")
}
