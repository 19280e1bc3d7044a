//! Locality-sensitive hashing over Euclidean space.
//!
//! Nearby points collide in the same bucket far more often than distant
//! ones: each of L tables keys its buckets by an amplified hash (a random
//! weighted combination of k elementary projections), so a query only ever
//! scores the union of its own buckets.
//!
//! # References
//!
//! - Datar et al. (2004): "Locality-Sensitive Hashing Scheme Based on
//!   p-Stable Distributions"
//! - Andoni & Indyk (2008): "Near-Optimal Hashing Algorithms for Approximate
//!   Nearest Neighbor in High Dimensions"

pub(crate) mod hash;
mod search;
mod table;

pub use search::{LshIndex, LshParams};
