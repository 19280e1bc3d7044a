//! Fixed-width hash tables mapping bucket ids to point labels.

use serde::{Deserialize, Serialize};

/// One LSH table: a fixed number of buckets, each holding the labels hashed
/// into it. Placement is `bucket_id % size`; the table stores labels into
/// the owning dataset, never vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HashTable {
    buckets: Vec<Vec<u32>>,
}

impl HashTable {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); size],
        }
    }

    pub(crate) fn insert(&mut self, bucket_id: u32, label: u32) {
        let slot = bucket_id as usize % self.buckets.len();
        self.buckets[slot].push(label);
    }

    pub(crate) fn bucket(&self, bucket_id: u32) -> &[u32] {
        &self.buckets[bucket_id as usize % self.buckets.len()]
    }

    /// Buckets with at least one entry, for build diagnostics.
    pub(crate) fn occupied(&self) -> usize {
        self.buckets.iter().filter(|b| !b.is_empty()).count()
    }
}
