//! Dataset loading and point access.
//!
//! A [`DataSet`] is the single owner of every point; indexes, graphs, and
//! clusterers borrow it for their whole lifetime and refer to points by
//! their dense 1-based labels.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, SearchError};

/// One dataset record: a dense 1-based label and its owned feature vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    label: u32,
    components: Vec<u8>,
}

impl DataPoint {
    fn new(label: u32, components: Vec<u8>) -> Self {
        Self { label, components }
    }

    /// 1-based dense label, unique within the owning dataset.
    #[must_use]
    pub fn label(&self) -> u32 {
        self.label
    }

    /// The feature vector.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.components
    }
}

/// An ordered, owned collection of labeled byte vectors sharing one
/// dimensionality. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DataSet {
    points: Vec<DataPoint>,
    dimension: usize,
}

impl DataSet {
    /// Build a dataset from raw vectors; labels are assigned `1..=n` in
    /// order. Every vector must share the first vector's length.
    pub fn from_vectors(vectors: Vec<Vec<u8>>) -> Result<Self> {
        let dimension = match vectors.first() {
            Some(first) => first.len(),
            None => return Err(SearchError::EmptyDataset),
        };
        if dimension == 0 {
            return Err(SearchError::InvalidParameter(
                "points need at least one component".to_string(),
            ));
        }

        let mut points = Vec::with_capacity(vectors.len());
        for (i, components) in vectors.into_iter().enumerate() {
            if components.len() != dimension {
                return Err(SearchError::DimensionMismatch {
                    expected: dimension,
                    actual: components.len(),
                });
            }
            points.push(DataPoint::new(i as u32 + 1, components));
        }

        Ok(Self { points, dimension })
    }

    /// Load every record from a binary idx file.
    ///
    /// Layout: four big-endian `u32` header words (magic, which is not
    /// validated, then record count, height, width) followed by `count`
    /// row-major vectors of `height * width` bytes each.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_file(path.as_ref(), None)
    }

    /// Load at most `limit` records (query sets are typically capped).
    pub fn load_limited<P: AsRef<Path>>(path: P, limit: usize) -> Result<Self> {
        Self::read_file(path.as_ref(), Some(limit))
    }

    fn read_file(path: &Path, limit: Option<usize>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut header = [0u32; 4];
        for word in &mut header {
            *word = read_be_u32(&mut reader)
                .map_err(|e| SearchError::Format(format!("truncated header: {e}")))?;
        }
        let [_magic, count, height, width] = header;

        let dimension = height as usize * width as usize;
        if dimension == 0 {
            return Err(SearchError::Format(
                "header declares zero-sized vectors".to_string(),
            ));
        }

        let count = match limit {
            Some(limit) => (count as usize).min(limit),
            None => count as usize,
        };
        if count == 0 {
            return Err(SearchError::EmptyDataset);
        }

        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let mut components = vec![0u8; dimension];
            reader.read_exact(&mut components).map_err(|e| {
                SearchError::Format(format!("truncated at record {} of {count}: {e}", i + 1))
            })?;
            points.push(DataPoint::new(i as u32 + 1, components));
        }

        Ok(Self { points, dimension })
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A constructed dataset is never empty, but the check keeps call sites
    /// honest.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shared dimensionality of every point.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dimension
    }

    /// Point by position (0-based). Panics if out of range.
    #[must_use]
    pub fn point(&self, index: usize) -> &DataPoint {
        &self.points[index]
    }

    /// Point by its 1-based label. Panics if the label is 0 or out of range.
    #[must_use]
    pub fn by_label(&self, label: u32) -> &DataPoint {
        &self.points[label as usize - 1]
    }

    /// Iterate points in label order.
    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataPoint;
    type IntoIter = std::slice::Iter<'a, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn read_be_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}
