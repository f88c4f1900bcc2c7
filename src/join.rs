//! Attaching cluster labels (and raw descriptive columns) to table rows.

use std::collections::HashMap;

use tracing::debug;

use crate::cluster::Partition;
use crate::error::{Error, Result};
use crate::table::{Column, FeatureMatrix, Table};

/// Name of the added cluster-id column.
pub const CLUSTER_COLUMN: &str = "cluster";

/// Name under which a raw column is re-attached.
pub fn original_name(column: &str) -> String {
    format!("{column}_original")
}

/// How rows of a raw source table are matched to augmented rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKey {
    /// Row `i` of the source is row `i` of the table that was clustered.
    /// Only valid when both were produced in the same row order.
    Position,
    /// Match on a record-id column present in both tables.
    Column(String),
}

/// A private copy of the clustered rows with a `cluster` column.
///
/// The table it was built from is never modified.
#[derive(Debug, Clone)]
pub struct AugmentedTable {
    table: Table,
    clusters: Vec<usize>,
    source_rows: Vec<usize>,
    base_rows: usize,
    k: usize,
}

impl AugmentedTable {
    /// Copy the rows of `table` that were clustered and label them.
    pub fn new(table: &Table, features: &FeatureMatrix, partition: &Partition) -> Result<Self> {
        if features.n_rows() != partition.len() {
            return Err(Error::RowCountMismatch {
                expected: features.n_rows(),
                found: partition.len(),
            });
        }
        // Every source row must index into `table`.
        if let Some(&last) = features.source_rows.iter().max() {
            if last >= table.n_rows() {
                return Err(Error::RowCountMismatch {
                    expected: table.n_rows(),
                    found: last + 1,
                });
            }
        }
        let cluster_col = Column::Numeric(partition.labels().iter().map(|&l| Some(l as f64)).collect());
        let augmented = table
            .select_rows(&features.source_rows)
            .with_column(CLUSTER_COLUMN, cluster_col)?;

        debug!(
            rows = augmented.n_rows(),
            skipped = table.n_rows() - augmented.n_rows(),
            k = partition.k(),
            "cluster labels attached"
        );
        Ok(Self {
            table: augmented,
            clusters: partition.labels().to_vec(),
            source_rows: features.source_rows.clone(),
            base_rows: table.n_rows(),
            k: partition.k(),
        })
    }

    /// Copy `columns` from `source` as `<name>_original`.
    pub fn attach_raw(mut self, source: &Table, columns: &[&str], key: &JoinKey) -> Result<Self> {
        let rows = match key {
            JoinKey::Position => {
                if source.n_rows() != self.base_rows {
                    return Err(Error::RowCountMismatch {
                        expected: self.base_rows,
                        found: source.n_rows(),
                    });
                }
                self.source_rows.clone()
            }
            JoinKey::Column(id) => self.key_rows(source, id)?,
        };

        for &name in columns {
            let column = source.column(name)?.select(&rows);
            self.table = self.table.with_column(original_name(name), column)?;
        }
        debug!(columns = columns.len(), ?key, "raw columns attached");
        Ok(self)
    }

    fn key_rows(&self, source: &Table, id: &str) -> Result<Vec<usize>> {
        let source_keys = source.column(id)?;
        let mut index: HashMap<String, usize> = HashMap::with_capacity(source.n_rows());
        for i in 0..source.n_rows() {
            if let Some(k) = source_keys.key_at(i) {
                index.entry(k).or_insert(i);
            }
        }

        let own_keys = self.table.column(id)?;
        (0..self.table.n_rows())
            .map(|i| {
                let key = own_keys.key_at(i).unwrap_or_default();
                index.get(&key).copied().ok_or_else(|| Error::MissingJoinKey {
                    column: id.to_string(),
                    key,
                })
            })
            .collect()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Cluster id per row.
    pub fn clusters(&self) -> &[usize] {
        &self.clusters
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }
}
