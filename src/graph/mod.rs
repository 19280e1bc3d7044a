//! Graph-based approximate indexes.
//!
//! Both graphs store adjacency as labels into the dataset and are built by
//! querying an [`Approximator`](crate::Approximator) once per point, in
//! parallel. They differ in shape and traversal: the plain k-NN graph is
//! walked greedily from random restarts, the occlusion-pruned MRNG
//! best-first from a fixed entry point.

mod gnn;
mod mrng;

pub use gnn::{GnnIndex, GnnParams};
pub use mrng::{MrngIndex, MrngParams};

/// Search candidate ordered by distance, ties broken by label so equal
/// distances pop deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) label: u32,
    pub(crate) distance: f64,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.label.cmp(&other.label))
    }
}
