use serde::Serialize;

use crate::error::{Error, Result};

/// An immutable assignment of rows to cluster ids in `0..k`.
///
/// Row `i` of the partition is row `i` of the feature matrix it was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    labels: Vec<usize>,
    k: usize,
}

impl Partition {
    pub(crate) fn new(labels: Vec<usize>, k: usize) -> Self {
        Self { labels, k }
    }

    /// Build a partition from externally produced labels.
    ///
    /// Fails if any label is `>= k`.
    pub fn from_labels(labels: Vec<usize>, k: usize) -> Result<Self> {
        if labels.iter().any(|&l| l >= k) {
            return Err(Error::InvalidParameter {
                name: "labels",
                message: "every label must be less than k",
            });
        }
        Ok(Self { labels, k })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of cluster ids, including any that ended up empty.
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Member count per cluster id.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.k];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}
