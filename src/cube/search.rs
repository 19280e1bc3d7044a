//! Hypercube index construction and search.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ann::Neighbor;
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::{Result, SearchError};
use crate::lsh::hash::LshHash;

/// Tuning parameters for [`CubeIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeParams {
    /// Projection window shared with the elementary hashes.
    pub window: u32,
    /// Hypercube dimensionality k' (bits per vertex id), at most 32.
    pub dimensions: usize,
    /// Vertices visited per query, in increasing Hamming distance.
    pub probes: usize,
    /// Candidate labels gathered per query before scoring (M).
    pub max_candidates: usize,
    /// Seed for projection construction; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for CubeParams {
    fn default() -> Self {
        Self {
            window: 2600,
            dimensions: 3,
            probes: 2,
            max_candidates: 10,
            seed: None,
        }
    }
}

impl CubeParams {
    /// Configure a deterministic seed for projection construction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Hypercube index: every point maps to the vertex of a k'-dimensional cube,
/// one bit per elementary projection. Since vertex assignment partitions the
/// dataset, each point lives in exactly one bucket.
pub struct CubeIndex<'a> {
    dataset: &'a DataSet,
    hashes: Vec<LshHash>,
    salts: Vec<u64>,
    vertices: HashMap<u32, Vec<u32>>,
    probes: usize,
    max_candidates: usize,
}

impl<'a> CubeIndex<'a> {
    /// Quantize every point onto the cube.
    pub fn new(dataset: &'a DataSet, params: &CubeParams) -> Result<Self> {
        if dataset.is_empty() {
            return Err(SearchError::EmptyDataset);
        }
        if params.dimensions == 0 || params.dimensions > 32 {
            return Err(SearchError::InvalidParameter(format!(
                "dimensions must be in 1..=32, got {}",
                params.dimensions
            )));
        }
        if params.window == 0 {
            return Err(SearchError::InvalidParameter(
                "window must be at least 1".to_string(),
            ));
        }
        if params.probes == 0 {
            return Err(SearchError::InvalidParameter(
                "probes must be at least 1".to_string(),
            ));
        }
        if params.max_candidates == 0 {
            return Err(SearchError::InvalidParameter(
                "max_candidates must be at least 1".to_string(),
            ));
        }

        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let hashes = (0..params.dimensions)
            .map(|_| LshHash::draw(dataset.dim(), params.window, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        let salts: Vec<u64> = (0..params.dimensions).map(|_| rng.random()).collect();

        let mut vertices: HashMap<u32, Vec<u32>> = HashMap::new();
        for point in dataset {
            let vertex = vertex_of(&hashes, &salts, point.data());
            vertices.entry(vertex).or_default().push(point.label());
        }

        debug!(
            points = dataset.len(),
            bits = params.dimensions,
            vertices = vertices.len(),
            "hypercube index built"
        );

        Ok(Self {
            dataset,
            hashes,
            salts,
            vertices,
            probes: params.probes,
            max_candidates: params.max_candidates,
        })
    }

    /// The dataset this index was built over.
    #[must_use]
    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    /// The k approximate nearest neighbors of `query`, ascending by
    /// distance.
    pub fn knn<Q>(&self, query: &[Q], k: usize, metric: Metric<u8, Q>) -> Result<Vec<Neighbor>>
    where
        Q: Copy + Into<f64>,
    {
        let mut scored = self.score_candidates(query, metric)?;
        scored.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Every probed point strictly within `radius` of `center`, unordered.
    pub fn range_search<Q>(
        &self,
        center: &[Q],
        radius: f64,
        metric: Metric<u8, Q>,
    ) -> Result<Vec<Neighbor>>
    where
        Q: Copy + Into<f64>,
    {
        let mut scored = self.score_candidates(center, metric)?;
        scored.retain(|&(_, distance)| distance < radius);
        Ok(scored)
    }

    /// Walk vertices outward from the query's own vertex in increasing
    /// Hamming distance, stopping at the probe budget or once enough
    /// candidates are gathered, then score them exactly.
    fn score_candidates<Q>(&self, query: &[Q], metric: Metric<u8, Q>) -> Result<Vec<Neighbor>>
    where
        Q: Copy + Into<f64>,
    {
        if query.len() != self.dataset.dim() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dataset.dim(),
                actual: query.len(),
            });
        }

        let home = vertex_of(&self.hashes, &self.salts, query);
        let bits = self.hashes.len();

        let mut labels = Vec::new();
        let mut visited = 0usize;
        'probing: for weight in 0..=bits {
            for mask in masks_of_weight(bits, weight) {
                if visited == self.probes || labels.len() >= self.max_candidates {
                    break 'probing;
                }
                visited += 1;
                if let Some(bucket) = self.vertices.get(&(home ^ mask)) {
                    for &label in bucket {
                        if labels.len() == self.max_candidates {
                            break;
                        }
                        labels.push(label);
                    }
                }
            }
        }

        Ok(labels
            .into_iter()
            .map(|label| (label, metric(self.dataset.by_label(label).data(), query)))
            .collect())
    }
}

/// Vertex id of a vector: one bit per projection, each chosen by a salted
/// coin on the elementary hash value so equal hashes always land on the
/// same side.
fn vertex_of<Q>(hashes: &[LshHash], salts: &[u64], point: &[Q]) -> u32
where
    Q: Copy + Into<f64>,
{
    let mut vertex = 0u32;
    for (bit, (hash, &salt)) in hashes.iter().zip(salts).enumerate() {
        if coin(hash.apply(point), salt) {
            vertex |= 1 << bit;
        }
    }
    vertex
}

/// Uniform bit for a hash value, stable per salt (splitmix64 finalizer).
fn coin(value: u32, salt: u64) -> bool {
    let mut x = u64::from(value) ^ salt;
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    x & 1 == 1
}

/// All masks over the low `bits` bits with exactly `weight` bits set.
fn masks_of_weight(bits: usize, weight: usize) -> Vec<u32> {
    let mut masks = Vec::new();
    let mut current = 0u32;
    extend_mask(bits, weight, 0, &mut current, &mut masks);
    masks
}

fn extend_mask(bits: usize, remaining: usize, start: usize, current: &mut u32, out: &mut Vec<u32>) {
    if remaining == 0 {
        out.push(*current);
        return;
    }
    for bit in start..=(bits - remaining) {
        *current |= 1 << bit;
        extend_mask(bits, remaining - 1, bit + 1, current, out);
        *current &= !(1 << bit);
    }
}
