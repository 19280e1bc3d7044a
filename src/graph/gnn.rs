//! Approximate k-NN graph with randomized multi-restart greedy search.
//!
//! Construction delegates neighbor discovery to an [`Approximator`], so the
//! graph is only as good as the index that built it. Queries trade
//! exhaustiveness for speed: a handful of greedy walks from random starts,
//! with every vector examined along the way remembered in one global
//! priority queue. Quality scales with `restarts * hops * expansions`
//! against the dataset size.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::info;

use crate::ann::{Approximator, Neighbor};
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::{Result, SearchError};
use crate::graph::Candidate;

/// Tuning parameters for [`GnnIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GnnParams {
    /// Neighbors stored per point (the k of the k-NN graph).
    pub graph_degree: usize,
    /// Greedy walks per query (R).
    pub restarts: usize,
    /// Hops per walk (T).
    pub hops: usize,
    /// Neighbors examined per hop (E).
    pub expansions: usize,
    /// Seed for restart selection; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GnnParams {
    fn default() -> Self {
        Self {
            graph_degree: 50,
            restarts: 10,
            hops: 10,
            expansions: 30,
            seed: None,
        }
    }
}

impl GnnParams {
    /// Configure a deterministic seed for restart selection.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Approximate k-NN graph queried by multi-restart greedy descent.
pub struct GnnIndex<'a> {
    dataset: &'a DataSet,
    edges: Vec<SmallVec<[u32; 32]>>,
    metric: Metric<u8, u8>,
    params: GnnParams,
    seed: u64,
}

impl<'a> GnnIndex<'a> {
    /// Build the adjacency by querying `approx` once per point, in parallel.
    /// Each point keeps its `graph_degree` nearest approximate neighbors,
    /// never itself.
    pub fn build(
        approx: &Approximator<'a>,
        metric: Metric<u8, u8>,
        params: &GnnParams,
    ) -> Result<Self> {
        if params.graph_degree == 0 {
            return Err(SearchError::InvalidParameter(
                "graph_degree must be at least 1".to_string(),
            ));
        }
        if params.restarts == 0 || params.hops == 0 || params.expansions == 0 {
            return Err(SearchError::InvalidParameter(
                "restarts, hops and expansions must be at least 1".to_string(),
            ));
        }

        let dataset = approx.dataset();
        let edges: Vec<SmallVec<[u32; 32]>> = (0..dataset.len())
            .into_par_iter()
            .map(|i| {
                let point = dataset.point(i);
                // one extra so the point can drop itself from its own list
                let found = approx.knn(point.data(), params.graph_degree + 1, metric)?;
                Ok(found
                    .into_iter()
                    .map(|(label, _)| label)
                    .filter(|&label| label != point.label())
                    .take(params.graph_degree)
                    .collect())
            })
            .collect::<Result<_>>()?;

        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            points = dataset.len(),
            degree = params.graph_degree,
            "knn graph built"
        );

        Ok(Self {
            dataset,
            edges,
            metric,
            params: params.clone(),
            seed,
        })
    }

    /// The dataset the graph was built over.
    #[must_use]
    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    /// Neighbor labels of `label`'s point.
    #[must_use]
    pub fn neighbors(&self, label: u32) -> &[u32] {
        &self.edges[label as usize - 1]
    }

    /// The `n` best neighbors of `query` found by the configured walks,
    /// ascending by distance.
    ///
    /// Every restart starts at a uniformly random point and descends while
    /// the closest examined neighbor keeps strictly improving; every
    /// neighbor examined anywhere in the query is remembered, and the `n`
    /// globally closest are returned.
    pub fn query(&self, query: &[u8], n: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dataset.dim() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dataset.dim(),
                actual: query.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut seen = HashSet::new();
        let mut best = BinaryHeap::new();

        for _ in 0..self.params.restarts {
            let start = rng.random_range(0..self.dataset.len());
            let mut current = self.dataset.point(start).label();
            let mut best_on_walk = f64::INFINITY;

            for _ in 0..self.params.hops {
                let mut closest_label = current;
                let mut closest_distance = f64::INFINITY;

                for &label in self.neighbors(current).iter().take(self.params.expansions) {
                    let distance = (self.metric)(self.dataset.by_label(label).data(), query);
                    if seen.insert(label) {
                        best.push(Reverse(Candidate { label, distance }));
                    }
                    if distance < closest_distance {
                        closest_distance = distance;
                        closest_label = label;
                    }
                }

                // the walk ends once a hop stops strictly improving
                if closest_distance >= best_on_walk {
                    break;
                }
                best_on_walk = closest_distance;
                current = closest_label;
            }
        }

        let mut result = Vec::with_capacity(n.min(best.len()));
        while result.len() < n {
            match best.pop() {
                Some(Reverse(c)) => result.push((c.label, c.distance)),
                None => break,
            }
        }
        Ok(result)
    }
}
