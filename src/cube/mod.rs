//! Hypercube projection index.
//!
//! A binary-quantized relative of LSH: each elementary projection
//! contributes one bit instead of one table, so the whole dataset partitions
//! across the vertices of a small cube and queries probe outward from their
//! own vertex in increasing Hamming distance.

mod search;

pub use search::{CubeIndex, CubeParams};
