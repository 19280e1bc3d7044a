//! The approximator contract: k-nearest-neighbor and range queries.
//!
//! Both hash-family indexes answer the same two questions, "which k points
//! look closest?" and "which points sit within this radius?", so they hang
//! behind one tagged variant. The graph indexes consume this contract during
//! construction and expose their own query surface.

use crate::cube::CubeIndex;
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::Result;
use crate::lsh::LshIndex;

/// One query hit: `(label, distance)`.
pub type Neighbor = (u32, f64);

/// A built index answering approximate k-NN and range queries.
///
/// The variant set is closed: locality-sensitive hash tables or hypercube
/// vertex quantization. Queries are generic over the element type so raw
/// byte points and `f64` cluster centers share one path.
pub enum Approximator<'a> {
    /// Locality-sensitive hash tables.
    Lsh(LshIndex<'a>),
    /// Hypercube vertex quantization.
    Cube(CubeIndex<'a>),
}

impl<'a> Approximator<'a> {
    /// The k approximate nearest neighbors of `query`, ascending by
    /// distance, at most k long.
    pub fn knn<Q>(&self, query: &[Q], k: usize, metric: Metric<u8, Q>) -> Result<Vec<Neighbor>>
    where
        Q: Copy + Into<f64>,
    {
        match self {
            Approximator::Lsh(index) => index.knn(query, k, metric),
            Approximator::Cube(index) => index.knn(query, k, metric),
        }
    }

    /// Every candidate strictly within `radius` of `center`, unordered.
    pub fn range_search<Q>(
        &self,
        center: &[Q],
        radius: f64,
        metric: Metric<u8, Q>,
    ) -> Result<Vec<Neighbor>>
    where
        Q: Copy + Into<f64>,
    {
        match self {
            Approximator::Lsh(index) => index.range_search(center, radius, metric),
            Approximator::Cube(index) => index.range_search(center, radius, metric),
        }
    }

    /// The dataset the index was built over.
    #[must_use]
    pub fn dataset(&self) -> &'a DataSet {
        match self {
            Approximator::Lsh(index) => index.dataset(),
            Approximator::Cube(index) => index.dataset(),
        }
    }
}
