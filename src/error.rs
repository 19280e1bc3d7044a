//! Error types for vecino.

use thiserror::Error;

/// Errors that can occur while loading data, building indexes, querying,
/// or clustering.
///
/// Configuration errors (wrong parameters, mismatched shapes) are fatal to
/// the enclosing operation and never retried; resource errors surface from
/// the dataset loader only. There are no transient errors: every operation
/// is deterministic given its inputs and seeds.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Dataset has no points.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A clusterer was asked to assign against zero clusters.
    #[error("no clusters present")]
    ZeroClusters,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between a query vector and the indexed dataset.
    #[error("dimension mismatch: expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Projection onto a dataset of a different size.
    #[error("dataset size mismatch: expected {expected} points, got {actual}")]
    DatasetSizeMismatch { expected: usize, actual: usize },

    /// I/O error while opening or reading a dataset file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed dataset file (truncated payload or inconsistent header).
    #[error("format error: {0}")]
    Format(String),
}

/// Result type for vecino operations.
pub type Result<T> = std::result::Result<T, SearchError>;
