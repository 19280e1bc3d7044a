//! Monotonic Relative Neighborhood Graph.
//!
//! Edges keep the monotonicity property: a candidate joins a point's
//! adjacency only when no already-accepted neighbor sits closer to it than
//! the point does. The pruned graph stays sparse but navigable, so a
//! best-first walk from one fixed entry point (the point nearest the
//! dataset centroid) reaches a high-recall frontier while touching few
//! vectors.
//!
//! # References
//!
//! - Fu et al. (2019): "Fast Approximate Nearest Neighbor Search With the
//!   Navigating Spreading-out Graph"

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::info;

use crate::ann::{Approximator, Neighbor};
use crate::dataset::DataSet;
use crate::distance::{euclidean, Metric};
use crate::error::{Result, SearchError};
use crate::graph::Candidate;

/// Tuning parameters for [`MrngIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrngParams {
    /// Approximate-neighbor candidates fetched per point during
    /// construction.
    pub candidates: usize,
    /// Edges kept per point after occlusion pruning.
    pub max_out_degree: usize,
}

impl Default for MrngParams {
    fn default() -> Self {
        Self {
            candidates: 50,
            max_out_degree: 20,
        }
    }
}

/// Occlusion-pruned navigable graph with a fixed centroid-nearest entry
/// point.
pub struct MrngIndex<'a> {
    dataset: &'a DataSet,
    edges: Vec<SmallVec<[u32; 32]>>,
    entry: u32,
    metric: Metric<u8, u8>,
}

impl<'a> MrngIndex<'a> {
    /// Build the pruned adjacency in parallel and fix the entry point.
    pub fn build(
        approx: &Approximator<'a>,
        metric: Metric<u8, u8>,
        params: &MrngParams,
    ) -> Result<Self> {
        if params.candidates == 0 || params.max_out_degree == 0 {
            return Err(SearchError::InvalidParameter(
                "candidates and max_out_degree must be at least 1".to_string(),
            ));
        }

        let dataset = approx.dataset();
        let edges: Vec<SmallVec<[u32; 32]>> = (0..dataset.len())
            .into_par_iter()
            .map(|i| {
                let point = dataset.point(i);
                let found = approx.knn(point.data(), params.candidates, metric)?;
                Ok(prune(
                    dataset,
                    point.label(),
                    &found,
                    params.max_out_degree,
                    metric,
                ))
            })
            .collect::<Result<_>>()?;

        let entry = nearest_to_centroid(dataset);
        info!(points = dataset.len(), entry, "mrng built");

        Ok(Self {
            dataset,
            edges,
            entry,
            metric,
        })
    }

    /// The dataset the graph was built over.
    #[must_use]
    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    /// Neighbor labels of `label`'s point, ascending by distance to it.
    #[must_use]
    pub fn neighbors(&self, label: u32) -> &[u32] {
        &self.edges[label as usize - 1]
    }

    /// Label of the fixed entry point (the point nearest the dataset
    /// centroid).
    #[must_use]
    pub fn entry(&self) -> u32 {
        self.entry
    }

    /// The `k` best neighbors of `query`, ascending by distance.
    ///
    /// Best-first expansion: repeatedly take the closest not-yet-expanded
    /// candidate and insert all of its neighbors, until at least
    /// `beam_width` distinct candidates have been gathered (or the reachable
    /// component is exhausted); the k closest gathered are the answer.
    pub fn query(&self, query: &[u8], k: usize, beam_width: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dataset.dim() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dataset.dim(),
                actual: query.len(),
            });
        }

        let entry_distance = (self.metric)(self.dataset.by_label(self.entry).data(), query);
        let mut inserted = HashSet::from([self.entry]);
        let mut gathered = vec![Candidate {
            label: self.entry,
            distance: entry_distance,
        }];
        let mut frontier = BinaryHeap::from([Reverse(gathered[0])]);

        while gathered.len() < beam_width {
            let Some(Reverse(current)) = frontier.pop() else {
                break;
            };
            for &label in self.neighbors(current.label) {
                if inserted.insert(label) {
                    let distance = (self.metric)(self.dataset.by_label(label).data(), query);
                    let candidate = Candidate { label, distance };
                    frontier.push(Reverse(candidate));
                    gathered.push(candidate);
                }
            }
        }

        gathered.sort_unstable();
        gathered.truncate(k);
        Ok(gathered.into_iter().map(|c| (c.label, c.distance)).collect())
    }
}

/// Occlusion rule: walking the candidates ascending by distance to the base
/// point, accept `y` only if no accepted `r` is closer to `y` than the base
/// is, stopping at the out-degree cap.
fn prune(
    dataset: &DataSet,
    base: u32,
    candidates: &[Neighbor],
    max_out_degree: usize,
    metric: Metric<u8, u8>,
) -> SmallVec<[u32; 32]> {
    let mut accepted: SmallVec<[u32; 32]> = SmallVec::new();
    for &(label, distance) in candidates {
        if label == base {
            continue;
        }
        if accepted.len() == max_out_degree {
            break;
        }
        let occluded = accepted.iter().any(|&r| {
            metric(dataset.by_label(r).data(), dataset.by_label(label).data()) < distance
        });
        if !occluded {
            accepted.push(label);
        }
    }
    accepted
}

/// The label of the point nearest the dataset's mean vector.
fn nearest_to_centroid(dataset: &DataSet) -> u32 {
    let mut centroid = vec![0.0f64; dataset.dim()];
    for point in dataset {
        for (acc, &component) in centroid.iter_mut().zip(point.data()) {
            *acc += f64::from(component);
        }
    }
    let n = dataset.len() as f64;
    for acc in &mut centroid {
        *acc /= n;
    }

    let mut best_label = 1u32;
    let mut best_distance = f64::INFINITY;
    for point in dataset {
        let distance = euclidean(point.data(), &centroid);
        if distance < best_distance {
            best_distance = distance;
            best_label = point.label();
        }
    }
    best_label
}
