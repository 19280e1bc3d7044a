//! Synthetic datasets and exact baselines for evaluating the approximate
//! indexes.
//!
//! The exact scans here are the ground truth that recall is measured
//! against; they are deliberately brute-force.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::ann::Neighbor;
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::{Result, SearchError};

/// A dataset of `clusters * per_cluster` points drawn around uniformly
/// random centers with Gaussian noise of standard deviation `spread`,
/// clamped to byte range.
pub fn clustered_dataset(
    clusters: usize,
    per_cluster: usize,
    dimension: usize,
    spread: f64,
    seed: Option<u64>,
) -> Result<DataSet> {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, spread)
        .map_err(|e| SearchError::InvalidParameter(format!("bad spread: {e}")))?;

    let mut vectors = Vec::with_capacity(clusters * per_cluster);
    for _ in 0..clusters {
        let center: Vec<f64> = (0..dimension)
            .map(|_| f64::from(rng.random_range(0..=255u8)))
            .collect();
        for _ in 0..per_cluster {
            vectors.push(
                center
                    .iter()
                    .map(|&c| (c + noise.sample(&mut rng)).clamp(0.0, 255.0) as u8)
                    .collect(),
            );
        }
    }
    DataSet::from_vectors(vectors)
}

/// A dataset of `count` points with every component uniform in byte
/// range.
pub fn uniform_dataset(count: usize, dimension: usize, seed: Option<u64>) -> Result<DataSet> {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let vectors = (0..count)
        .map(|_| (0..dimension).map(|_| rng.random()).collect())
        .collect();
    DataSet::from_vectors(vectors)
}

/// The true k nearest neighbors of `query` by full scan, ascending by
/// distance with label ties broken ascending.
pub fn exact_knn<Q>(dataset: &DataSet, query: &[Q], k: usize, metric: Metric<u8, Q>) -> Vec<Neighbor>
where
    Q: Copy + Into<f64>,
{
    let mut all: Vec<Neighbor> = dataset
        .iter()
        .map(|point| (point.label(), metric(point.data(), query)))
        .collect();
    all.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    all.truncate(k);
    all
}

/// Every point strictly within `radius` of `query`, by full scan.
pub fn exact_range_search<Q>(
    dataset: &DataSet,
    query: &[Q],
    radius: f64,
    metric: Metric<u8, Q>,
) -> Vec<Neighbor>
where
    Q: Copy + Into<f64>,
{
    dataset
        .iter()
        .map(|point| (point.label(), metric(point.data(), query)))
        .filter(|&(_, distance)| distance < radius)
        .collect()
}

/// Fraction of the true neighbor labels that the approximate answer
/// found. An empty truth set counts as fully recalled.
#[must_use]
pub fn recall(found: &[Neighbor], truth: &[Neighbor]) -> f64 {
    if truth.is_empty() {
        return 1.0;
    }
    let hits = truth
        .iter()
        .filter(|(label, _)| found.iter().any(|(f, _)| f == label))
        .count();
    hits as f64 / truth.len() as f64
}
