//! Elementary and amplified LSH hash functions.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::distance::dot;
use crate::error::{Result, SearchError};

/// Bucket ids are reduced modulo this prime (`2^32 - 5`) before table
/// placement, keeping the amplified combination bounded and bias-free.
pub(crate) const BUCKET_MODULUS: u64 = u32::MAX as u64 - 4;

/// One random projection: `h(p) = floor(v . p + t)`.
///
/// The direction `v` has i.i.d. Normal(0, 1/window) components and the
/// offset `t` is uniform in [0, 1), so points within roughly `window` of
/// each other collide far more often than distant ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshHash {
    direction: Vec<f64>,
    offset: f64,
}

impl LshHash {
    /// Draw a fresh projection for `dimension`-component vectors.
    pub(crate) fn draw(dimension: usize, window: u32, rng: &mut StdRng) -> Result<Self> {
        let normal = Normal::new(0.0, 1.0 / f64::from(window))
            .map_err(|e| SearchError::InvalidParameter(format!("window {window}: {e}")))?;
        let direction = (0..dimension).map(|_| normal.sample(rng)).collect();
        let offset = rng.random_range(0.0..1.0);
        Ok(Self { direction, offset })
    }

    /// Hash a vector. The floored projection can be negative; it is wrapped
    /// into `u32` so the downstream modular arithmetic stays defined.
    #[must_use]
    pub fn apply<T>(&self, point: &[T]) -> u32
    where
        T: Copy + Into<f64>,
    {
        let projected = dot(&self.direction, point) + self.offset;
        projected.floor() as i64 as u32
    }
}

/// `k` elementary hashes combined into one bucket id:
/// `g(p) = (Σ rᵢ·hᵢ(p) mod M) mod M` with per-hash random `u32` weights.
///
/// The weighted combination decorrelates buckets across tables while keeping
/// ids reproducible and below the modulus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshAmplifiedHash {
    hashes: Vec<LshHash>,
    weights: Vec<u32>,
}

impl LshAmplifiedHash {
    pub(crate) fn draw(dimension: usize, window: u32, k: usize, rng: &mut StdRng) -> Result<Self> {
        let hashes = (0..k)
            .map(|_| LshHash::draw(dimension, window, rng))
            .collect::<Result<Vec<_>>>()?;
        let weights = (0..k).map(|_| rng.random::<u32>()).collect();
        Ok(Self { hashes, weights })
    }

    /// Bucket id for a vector, always below `2^32 - 5`.
    #[must_use]
    pub fn apply<T>(&self, point: &[T]) -> u32
    where
        T: Copy + Into<f64>,
    {
        let mut sum = 0u64;
        for (hash, &weight) in self.hashes.iter().zip(&self.weights) {
            let term = u64::from(weight) * u64::from(hash.apply(point));
            sum = (sum + term % BUCKET_MODULUS) % BUCKET_MODULUS;
        }
        sum as u32
    }

    /// Number of elementary hashes combined.
    #[must_use]
    pub fn k(&self) -> usize {
        self.hashes.len()
    }
}
