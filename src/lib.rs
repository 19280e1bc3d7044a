//! vecino: approximate similarity search over byte-vector datasets.
//!
//! Three interchangeable index families behind one query contract
//! (k-nearest-neighbor and range search), plus a clustering layer built
//! on top of it:
//!
//! - `lsh/`: hash-bucket indexing over random projections
//! - `cube/`: Hypercube bit-quantization with Hamming-ball probing
//! - `graph/`: navigable graphs (multi-restart greedy, MRNG best-first)
//! - `cluster/`: Lloyd k-means and approximate reverse assignment
//!
//! # Tuning Nuances
//!
//! ## The window drives everything in LSH
//!
//! An elementary hash floors `dot(v, p) + t` where `v` is Gaussian with
//! variance `1/window²`. Small windows shatter the space into many thin
//! slabs (high precision, low recall per table); large windows merge
//! distant points into the same slab. The defaults here assume byte
//! vectors in the hundreds of dimensions; shrink the window when vectors
//! are short or sparse.
//!
//! ## Graph indexes inherit their builder's quality
//!
//! Both graph variants take their adjacency from an [`Approximator`]'s
//! approximate k-NN answers. A badly tuned LSH underneath produces a
//! badly connected graph that no amount of restarts or beam width
//! repairs. Build graphs over a generously parameterized index, then
//! tune query cost.
//!
//! ## When exhaustive scans win
//!
//! Under a few thousand points, [`benchmark::exact_knn`] is usually
//! faster than any index built here, and it is exact. The approximate
//! machinery pays off when scans stop fitting the query budget.

pub mod ann;
pub mod benchmark;
pub mod cluster;
pub mod cube;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod graph;
pub mod lsh;

pub use ann::{Approximator, Neighbor};
pub use cluster::{Cluster, Clusterer};
pub use cube::{CubeIndex, CubeParams};
pub use dataset::{DataPoint, DataSet};
pub use error::{Result, SearchError};
pub use graph::{GnnIndex, GnnParams, MrngIndex, MrngParams};
pub use lsh::{LshIndex, LshParams};
