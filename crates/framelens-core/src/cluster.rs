//! K-means Color Clustering
//!
//! Dominant colors are the centroids of k-means over pixel observations.
//!
//! - Seeding: k-means++ (each new center drawn with probability
//!   proportional to its squared distance from the nearest existing center)
//! - Termination: the largest squared center shift drops below `epsilon`,
//!   or `max_iterations` rounds have run
//! - Restarts: `attempts` independent runs; the lowest compactness
//!   (sum of squared distances to the assigned center) wins

use crate::buffer::ColorTriplet;
use crate::error::{AnalysisError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for k-means clustering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
	/// Upper bound on assign/update rounds per attempt
	pub max_iterations: usize,
	/// Convergence threshold on the largest squared center shift
	pub epsilon: f64,
	/// Independent restarts; the most compact result is kept
	pub attempts: usize,
	/// Fixed RNG seed for reproducible output (`None` seeds from entropy)
	pub seed: Option<u64>,
}

impl Default for KMeansConfig {
	fn default() -> Self {
		Self {
			max_iterations: 10,
			epsilon: 1.0,
			attempts: 3,
			seed: None,
		}
	}
}

/// Outcome of a clustering run.
#[derive(Clone, Debug)]
pub struct Clustering {
	/// One centroid per cluster, in cluster order
	pub centers: Vec<ColorTriplet>,
	/// Sum of squared distances from each point to its center
	pub compactness: f64,
	/// Rounds executed by the winning attempt
	pub iterations: usize,
}

/// Cluster color observations into exactly `k` centers.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyBuffer`] when `points` is empty and
/// [`AnalysisError::InvalidConfig`] when `k` is zero.
pub fn kmeans(points: &[[u8; 3]], k: usize, config: &KMeansConfig) -> Result<Clustering> {
	if points.is_empty() {
		return Err(AnalysisError::EmptyBuffer);
	}
	if k == 0 {
		return Err(AnalysisError::InvalidConfig("cluster count must be positive".into()));
	}

	let mut rng = config
		.seed
		.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

	let mut best = run_attempt(points, k, config, &mut rng);
	for attempt in 1..config.attempts.max(1) {
		let candidate = run_attempt(points, k, config, &mut rng);
		tracing::debug!(
			attempt,
			compactness = candidate.compactness,
			iterations = candidate.iterations,
			"k-means attempt finished"
		);
		if candidate.compactness < best.compactness {
			best = candidate;
		}
	}
	Ok(best)
}

fn run_attempt(points: &[[u8; 3]], k: usize, config: &KMeansConfig, rng: &mut StdRng) -> Clustering {
	let mut centers = seed_centers(points, k, rng);
	let mut iterations = 0;

	while iterations < config.max_iterations {
		iterations += 1;

		let mut sums = vec![[0.0_f64; 3]; k];
		let mut counts = vec![0_usize; k];
		for point in points {
			let (nearest, _) = nearest_center(point, &centers);
			counts[nearest] += 1;
			for (sum, &component) in sums[nearest].iter_mut().zip(point) {
				*sum += f64::from(component);
			}
		}

		let mut largest_shift = 0.0_f64;
		for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
			// An empty cluster keeps its previous center
			if count == 0 {
				continue;
			}
			let updated = (*sum).map(|s| s / count as f64);
			largest_shift = largest_shift.max(squared_distance_f64(center, &updated));
			*center = updated;
		}

		if largest_shift < config.epsilon {
			break;
		}
	}

	let compactness = points
		.iter()
		.map(|point| nearest_center(point, &centers).1)
		.sum();

	Clustering {
		centers,
		compactness,
		iterations,
	}
}

/// k-means++ seeding.
fn seed_centers(points: &[[u8; 3]], k: usize, rng: &mut StdRng) -> Vec<ColorTriplet> {
	let first = to_triplet(&points[rng.gen_range(0..points.len())]);
	let mut distances: Vec<f64> = points.iter().map(|p| squared_distance(p, &first)).collect();
	let mut centers = Vec::with_capacity(k);
	centers.push(first);

	while centers.len() < k {
		// All weights zero means every point already sits on a center
		let index = match WeightedIndex::new(&distances) {
			Ok(weights) => weights.sample(rng),
			Err(_) => rng.gen_range(0..points.len()),
		};
		let next = to_triplet(&points[index]);
		for (distance, point) in distances.iter_mut().zip(points) {
			*distance = distance.min(squared_distance(point, &next));
		}
		centers.push(next);
	}
	centers
}

#[inline]
fn nearest_center(point: &[u8; 3], centers: &[ColorTriplet]) -> (usize, f64) {
	let mut best = (0, f64::INFINITY);
	for (index, center) in centers.iter().enumerate() {
		let distance = squared_distance(point, center);
		if distance < best.1 {
			best = (index, distance);
		}
	}
	best
}

#[inline]
fn squared_distance(point: &[u8; 3], center: &ColorTriplet) -> f64 {
	point
		.iter()
		.zip(center)
		.map(|(&p, &c)| (f64::from(p) - c).powi(2))
		.sum()
}

#[inline]
fn squared_distance_f64(a: &ColorTriplet, b: &ColorTriplet) -> f64 {
	a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn to_triplet(point: &[u8; 3]) -> ColorTriplet {
	(*point).map(f64::from)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn seeded() -> KMeansConfig {
		KMeansConfig {
			seed: Some(7),
			..KMeansConfig::default()
		}
	}

	#[test]
	fn test_single_color_yields_that_color() {
		let points = vec![[255, 0, 0]; 100];
		let result = kmeans(&points, 1, &seeded()).unwrap();
		assert_eq!(result.centers, vec![[255.0, 0.0, 0.0]]);
		assert_eq!(result.compactness, 0.0);
	}

	#[test]
	fn test_k_exceeding_distinct_colors_still_returns_k() {
		let points = vec![[10, 20, 30]; 16];
		let result = kmeans(&points, 3, &seeded()).unwrap();
		assert_eq!(result.centers.len(), 3);
		for center in &result.centers {
			assert_eq!(*center, [10.0, 20.0, 30.0]);
		}
	}

	#[test]
	fn test_separates_two_blobs() {
		let mut points = vec![[0, 0, 0]; 50];
		points.extend(vec![[250, 250, 250]; 50]);
		let result = kmeans(&points, 2, &seeded()).unwrap();

		let mut centers = result.centers;
		centers.sort_by(|a, b| a[0].total_cmp(&b[0]));
		assert_eq!(centers, vec![[0.0; 3], [250.0; 3]]);
	}

	#[test]
	fn test_seed_makes_runs_reproducible() {
		let points: Vec<[u8; 3]> = (0..=255_u8).map(|v| [v, v / 2, 255 - v]).collect();
		let first = kmeans(&points, 4, &seeded()).unwrap();
		let second = kmeans(&points, 4, &seeded()).unwrap();
		assert_eq!(first.centers, second.centers);
	}

	#[test]
	fn test_iterations_capped() {
		let points: Vec<[u8; 3]> = (0..=255_u8).map(|v| [v, v, v]).collect();
		let config = KMeansConfig {
			max_iterations: 2,
			epsilon: 0.0,
			..seeded()
		};
		let result = kmeans(&points, 5, &config).unwrap();
		assert!(result.iterations <= 2);
	}

	#[test]
	fn test_rejects_degenerate_input() {
		assert!(matches!(kmeans(&[], 3, &seeded()), Err(AnalysisError::EmptyBuffer)));
		assert!(matches!(
			kmeans(&[[1, 2, 3]], 0, &seeded()),
			Err(AnalysisError::InvalidConfig(_))
		));
	}
}
