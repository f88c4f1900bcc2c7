//! Per-cluster aggregates over an [`AugmentedTable`].
//!
//! Every table has one row per cluster id that occurs in the augmented rows,
//! in ascending id order. Category columns follow the caller's order.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::features::ColumnDescriptor;
use crate::join::AugmentedTable;

/// A cluster × category table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTable {
    pub clusters: Vec<usize>,
    pub categories: Vec<String>,
    /// `values[row][col]` for `clusters[row]` and `categories[col]`.
    pub values: Vec<Vec<f64>>,
}

/// One cell of a [`GroupTable`] in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
    pub cluster: usize,
    pub category: String,
    pub value: f64,
}

impl GroupTable {
    /// Long form: cluster-major, categories in column order.
    pub fn melt(&self) -> Vec<TidyRow> {
        let mut out = Vec::with_capacity(self.clusters.len() * self.categories.len());
        for (row, &cluster) in self.values.iter().zip(&self.clusters) {
            for (value, category) in row.iter().zip(&self.categories) {
                out.push(TidyRow {
                    cluster,
                    category: category.clone(),
                    value: *value,
                });
            }
        }
        out
    }

    /// Sum of column `col` over all clusters.
    pub fn column_total(&self, col: usize) -> f64 {
        self.values.iter().map(|row| row[col]).sum()
    }
}

/// Number of rows in a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterSize {
    pub cluster: usize,
    pub size: usize,
}

/// Min, quartiles and max, with linear interpolation between order statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// A cluster's raw values of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub cluster: usize,
    /// Non-missing values, in row order.
    pub values: Vec<f64>,
    /// `None` when the cluster has no non-missing values.
    pub summary: Option<FiveNumberSummary>,
}

fn present_clusters(aug: &AugmentedTable) -> Vec<usize> {
    let mut ids = aug.clusters().to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Column-wise sums per cluster. Missing cells contribute nothing.
pub fn sum_by_cluster(aug: &AugmentedTable, columns: &[ColumnDescriptor]) -> Result<GroupTable> {
    let clusters = present_clusters(aug);
    let cells: Vec<&[Option<f64>]> = columns
        .iter()
        .map(|c| aug.table().numeric(&c.column))
        .collect::<Result<_>>()?;

    let mut values = vec![vec![0.0f64; columns.len()]; clusters.len()];
    for (i, label) in aug.clusters().iter().enumerate() {
        // `clusters` is sorted and contains every label.
        let row = clusters.partition_point(|c| c < label);
        for (j, col) in cells.iter().enumerate() {
            values[row][j] += col[i].unwrap_or(0.0);
        }
    }

    debug!(clusters = clusters.len(), columns = columns.len(), "summed by cluster");
    Ok(GroupTable {
        clusters,
        categories: columns.iter().map(|c| c.label.clone()).collect(),
        values,
    })
}

/// Group sizes per (cluster, value of `column`), zero-filled.
///
/// Only the listed values become categories; rows holding any other value,
/// or a missing one, are not counted.
pub fn count_by_cluster_and_value(
    aug: &AugmentedTable,
    column: &str,
    categories: &[(f64, &str)],
) -> Result<GroupTable> {
    let clusters = present_clusters(aug);
    let cells = aug.table().numeric(column)?;

    let mut values = vec![vec![0.0f64; categories.len()]; clusters.len()];
    let mut unmatched = 0usize;
    for (i, label) in aug.clusters().iter().enumerate() {
        let row = clusters.partition_point(|c| c < label);
        match cells[i].and_then(|v| categories.iter().position(|(c, _)| *c == v)) {
            Some(j) => values[row][j] += 1.0,
            None => unmatched += 1,
        }
    }
    if unmatched > 0 {
        debug!(column, unmatched, "rows outside the listed categories");
    }

    Ok(GroupTable {
        clusters,
        categories: categories.iter().map(|(_, l)| l.to_string()).collect(),
        values,
    })
}

/// Row count per cluster.
pub fn cluster_sizes(aug: &AugmentedTable) -> Vec<ClusterSize> {
    let mut sizes = vec![0usize; aug.k()];
    for &l in aug.clusters() {
        sizes[l] += 1;
    }
    sizes
        .into_iter()
        .enumerate()
        .filter(|&(_, size)| size > 0)
        .map(|(cluster, size)| ClusterSize { cluster, size })
        .collect()
}

/// Per-cluster values of `column` with a five-number summary each.
pub fn distribution_by_cluster(aug: &AugmentedTable, column: &str) -> Result<Vec<Distribution>> {
    let clusters = present_clusters(aug);
    let cells = aug.table().numeric(column)?;

    let mut grouped: Vec<Vec<f64>> = vec![Vec::new(); clusters.len()];
    for (i, label) in aug.clusters().iter().enumerate() {
        if let Some(v) = cells[i].filter(|v| !v.is_nan()) {
            grouped[clusters.partition_point(|c| c < label)].push(v);
        }
    }

    Ok(clusters
        .into_iter()
        .zip(grouped)
        .map(|(cluster, values)| Distribution {
            cluster,
            summary: five_number_summary(&values),
            values,
        })
        .collect())
}

/// `None` for an empty slice.
pub fn five_number_summary(values: &[f64]) -> Option<FiveNumberSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(FiveNumberSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Partition;
    use crate::table::{Column, Table};

    fn augmented() -> AugmentedTable {
        let table = Table::from_columns(vec![
            ("f".into(), Column::Numeric(vec![Some(0.0); 5])),
            ("adopted".into(), Column::Numeric(vec![Some(1.0), Some(0.0), Some(1.0), Some(1.0), None])),
            ("died".into(), Column::Numeric(vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0), Some(1.0)])),
            ("mix".into(), Column::Numeric(vec![Some(1.0), Some(1.0), Some(0.0), Some(2.0), Some(0.0)])),
            ("days".into(), Column::Numeric(vec![Some(1.0), Some(3.0), Some(2.0), None, Some(10.0)])),
        ])
        .unwrap();
        let fm = table.feature_matrix(&["f".into()]).unwrap();
        // Cluster 1 of 4 stays empty.
        let p = Partition::from_labels(vec![2, 0, 2, 0, 3], 4).unwrap();
        AugmentedTable::new(&table, &fm, &p).unwrap()
    }

    fn descriptors() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("died", "Died"),
            ColumnDescriptor::new("adopted", "Adopted"),
        ]
    }

    #[test]
    fn test_sum_by_cluster() {
        let g = sum_by_cluster(&augmented(), &descriptors()).unwrap();
        assert_eq!(g.clusters, vec![0, 2, 3]);
        assert_eq!(g.categories, vec!["Died", "Adopted"]);
        assert_eq!(g.values, vec![vec![1.0, 1.0], vec![0.0, 2.0], vec![1.0, 0.0]]);
        assert_eq!(g.column_total(0), 2.0);
        assert_eq!(g.column_total(1), 3.0);
    }

    #[test]
    fn test_melt_order() {
        let g = sum_by_cluster(&augmented(), &descriptors()).unwrap();
        let tidy = g.melt();
        assert_eq!(tidy.len(), 6);
        assert_eq!(tidy[0], TidyRow { cluster: 0, category: "Died".into(), value: 1.0 });
        assert_eq!(tidy[1].category, "Adopted");
        assert_eq!(tidy[2].cluster, 2);
        assert_eq!(tidy[5], TidyRow { cluster: 3, category: "Adopted".into(), value: 0.0 });
    }

    #[test]
    fn test_count_by_value() {
        let g = count_by_cluster_and_value(
            &augmented(),
            "mix",
            &[(0.0, "Purebred"), (1.0, "Mixed breed")],
        )
        .unwrap();
        assert_eq!(g.values, vec![vec![0.0, 1.0], vec![1.0, 1.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_cluster_sizes_skip_empty() {
        let sizes = cluster_sizes(&augmented());
        assert_eq!(
            sizes,
            vec![
                ClusterSize { cluster: 0, size: 2 },
                ClusterSize { cluster: 2, size: 2 },
                ClusterSize { cluster: 3, size: 1 },
            ]
        );
    }

    #[test]
    fn test_distribution() {
        let d = distribution_by_cluster(&augmented(), "days").unwrap();
        assert_eq!(d[0].values, vec![3.0]);
        assert_eq!(d[1].values, vec![1.0, 2.0]);
        let s = d[1].summary.unwrap();
        assert_eq!((s.min, s.median, s.max), (1.0, 1.5, 2.0));
        assert_eq!(s.q1, 1.25);
    }

    #[test]
    fn test_five_number_summary() {
        let s = five_number_summary(&[7.0, 1.0, 3.0, 5.0, 9.0]).unwrap();
        assert_eq!(s, FiveNumberSummary { min: 1.0, q1: 3.0, median: 5.0, q3: 7.0, max: 9.0 });
        assert!(five_number_summary(&[]).is_none());
    }

    #[test]
    fn test_unknown_column() {
        let bad = vec![ColumnDescriptor::new("nope", "Nope")];
        assert!(sum_by_cluster(&augmented(), &bad).is_err());
    }
}
