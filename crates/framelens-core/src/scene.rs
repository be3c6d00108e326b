//! Scene-change detection over consecutive frame differences.
//!
//! `differences[i]` is the mean absolute grayscale difference between sampled
//! frames `i` and `i + 1`, so a spike at `differences[i]` marks frame `i + 1`
//! as the first frame of a new scene.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds for scene-change detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
	/// A difference must exceed this multiple of the running average
	pub threshold_multiplier: f64,
	/// Absolute floor on a flagged difference (0-255 intensity scale)
	pub min_difference: f64,
}

impl Default for SceneConfig {
	fn default() -> Self {
		Self {
			threshold_multiplier: 3.0,
			min_difference: 8.0,
		}
	}
}

impl SceneConfig {
	/// # Errors
	///
	/// Returns [`AnalysisError::InvalidConfig`] for a non-positive multiplier
	/// or a negative floor.
	pub fn validate(&self) -> Result<()> {
		if self.threshold_multiplier.is_nan() || self.threshold_multiplier <= 0.0 {
			return Err(AnalysisError::InvalidConfig(
				"scene threshold multiplier must be positive".into(),
			));
		}
		if self.min_difference.is_nan() || self.min_difference < 0.0 {
			return Err(AnalysisError::InvalidConfig(
				"scene minimum difference must not be negative".into(),
			));
		}
		Ok(())
	}
}

/// Frame indices that start a new scene, strictly ascending.
///
/// The first difference only seeds the running average, so the earliest
/// index that can be flagged is 2.
#[must_use]
pub fn detect_scene_changes(differences: &[f64], config: &SceneConfig) -> Vec<usize> {
	let mut changes = Vec::new();
	let mut total = 0.0;

	for (i, &difference) in differences.iter().enumerate() {
		if i > 0 {
			let running_average = total / i as f64;
			if difference >= config.min_difference
				&& difference > config.threshold_multiplier * running_average
			{
				changes.push(i + 1);
			}
		}
		total += difference;
	}
	changes
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_steady_footage_has_no_changes() {
		let differences = vec![2.0; 20];
		assert!(detect_scene_changes(&differences, &SceneConfig::default()).is_empty());
	}

	#[test]
	fn test_single_cut_is_flagged() {
		let mut differences = vec![2.0; 10];
		differences[5] = 120.0;
		assert_eq!(detect_scene_changes(&differences, &SceneConfig::default()), vec![6]);
	}

	#[test]
	fn test_static_noise_below_floor_is_ignored() {
		// Relative jump is huge but the absolute change is tiny
		let differences = vec![0.0, 0.0, 0.5, 0.0];
		assert!(detect_scene_changes(&differences, &SceneConfig::default()).is_empty());
	}

	#[test]
	fn test_indices_ascend_and_stay_in_range() {
		let differences = vec![1.0, 50.0, 1.0, 1.0, 200.0, 1.0, 900.0];
		let changes = detect_scene_changes(&differences, &SceneConfig::default());
		assert!(changes.windows(2).all(|w| w[0] < w[1]));
		assert!(changes.iter().all(|&i| i >= 2 && i <= differences.len()));
		assert_eq!(changes, vec![2, 5, 7]);
	}

	#[test]
	fn test_too_few_differences() {
		assert!(detect_scene_changes(&[], &SceneConfig::default()).is_empty());
		assert!(detect_scene_changes(&[255.0], &SceneConfig::default()).is_empty());
	}

	#[test]
	fn test_validate() {
		assert!(SceneConfig::default().validate().is_ok());
		let bad = SceneConfig {
			threshold_multiplier: 0.0,
			..SceneConfig::default()
		};
		assert!(bad.validate().is_err());
	}
}
