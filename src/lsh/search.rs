//! LSH index construction and search.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ann::Neighbor;
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::{Result, SearchError};
use crate::lsh::hash::LshAmplifiedHash;
use crate::lsh::table::HashTable;

/// Tuning parameters for [`LshIndex`].
///
/// Result quality is purely a function of `(window, hashes_per_table,
/// tables, table_size)`; no distance bound is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshParams {
    /// Projection window; larger windows make distant points collide more.
    pub window: u32,
    /// Elementary hashes combined per table (k).
    pub hashes_per_table: usize,
    /// Independent hash tables (L).
    pub tables: usize,
    /// Buckets per table; `None` derives `|dataset| / 8`.
    pub table_size: Option<usize>,
    /// Seed for hash-family construction; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            window: 2600,
            hashes_per_table: 4,
            tables: 5,
            table_size: None,
            seed: None,
        }
    }
}

impl LshParams {
    /// Configure a deterministic seed for hash-family construction.
    ///
    /// Indexes built with the same seed over the same dataset answer every
    /// query identically.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// LSH index: L independent tables, each keyed by an amplified hash over k
/// random projections. Built once from a dataset; queries scan only the
/// points colliding with the query in at least one table.
pub struct LshIndex<'a> {
    dataset: &'a DataSet,
    hashes: Vec<LshAmplifiedHash>,
    tables: Vec<HashTable>,
}

impl<'a> LshIndex<'a> {
    /// Build the full hashing scheme over `dataset`.
    pub fn new(dataset: &'a DataSet, params: &LshParams) -> Result<Self> {
        if dataset.is_empty() {
            return Err(SearchError::EmptyDataset);
        }
        if params.tables == 0 {
            return Err(SearchError::InvalidParameter(
                "tables must be at least 1".to_string(),
            ));
        }
        if params.hashes_per_table == 0 {
            return Err(SearchError::InvalidParameter(
                "hashes_per_table must be at least 1".to_string(),
            ));
        }
        if params.window == 0 {
            return Err(SearchError::InvalidParameter(
                "window must be at least 1".to_string(),
            ));
        }
        if params.table_size == Some(0) {
            return Err(SearchError::InvalidParameter(
                "table_size must be at least 1".to_string(),
            ));
        }
        let table_size = params
            .table_size
            .unwrap_or_else(|| (dataset.len() / 8).max(1));

        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut hashes = Vec::with_capacity(params.tables);
        let mut tables = Vec::with_capacity(params.tables);
        for _ in 0..params.tables {
            let hash = LshAmplifiedHash::draw(
                dataset.dim(),
                params.window,
                params.hashes_per_table,
                &mut rng,
            )?;
            let mut table = HashTable::new(table_size);
            for point in dataset {
                table.insert(hash.apply(point.data()), point.label());
            }
            hashes.push(hash);
            tables.push(table);
        }

        debug!(
            points = dataset.len(),
            tables = tables.len(),
            table_size,
            occupied = tables.iter().map(HashTable::occupied).sum::<usize>(),
            "lsh index built"
        );

        Ok(Self {
            dataset,
            hashes,
            tables,
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

    /// Every colliding point strictly within `radius` of `center`,
    /// unordered.
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

    /// Union of the query's buckets across all tables, deduplicated by
    /// label and scored with the caller's exact metric.
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

        let mut seen = HashSet::new();
        let mut scored = Vec::new();
        for (hash, table) in self.hashes.iter().zip(&self.tables) {
            for &label in table.bucket(hash.apply(query)) {
                if seen.insert(label) {
                    let point = self.dataset.by_label(label);
                    scored.push((label, metric(point.data(), query)));
                }
            }
        }
        Ok(scored)
    }
}
