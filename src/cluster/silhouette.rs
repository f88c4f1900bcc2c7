//! Silhouette diagnostics for a fitted partition.
//!
//! For point `i` in cluster `C`:
//!
//! ```text
//! a(i) = mean distance from i to the other members of C
//! b(i) = min over C' != C of the mean distance from i to the members of C'
//! s(i) = (b(i) - a(i)) / max(a(i), b(i))
//! ```
//!
//! `s(i)` is 0 when `C` is a singleton, and also when `a(i) = b(i) = 0`
//! (coincident points), so every coefficient is finite and in `[-1, 1]`.
//!
//! Distances are accumulated per cluster on the fly, so memory is `O(k)` per
//! point rather than an `n * n` distance matrix. Time is `O(n² · d)`.
//!
//! # Band layout
//!
//! [`silhouette_bands`] lays out each cluster's sorted coefficients along a
//! vertical axis for a banded plot: cluster 0 starts at [`BAND_START`], each
//! band spans its cluster's size, and the next band starts [`BAND_GAP`] above
//! the previous band's end.

use serde::Serialize;
use tracing::debug;

use super::partition::Partition;
use super::util::{self, euclidean};
use crate::error::{Error, Result};

/// Vertical offset of the first band.
pub const BAND_START: usize = 10;

/// Vertical gap between consecutive bands.
pub const BAND_GAP: usize = 10;

/// One cluster's sorted coefficients and where they sit on the vertical axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilhouetteBand {
    /// Cluster id.
    pub cluster: usize,
    /// First vertical position (inclusive).
    pub y_lower: usize,
    /// One past the last vertical position.
    pub y_upper: usize,
    /// Coefficients of the cluster's members, ascending.
    pub values: Vec<f64>,
}

/// Silhouette scores for a partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilhouetteReport {
    /// Mean of all per-point coefficients.
    pub mean: f64,
    /// Per-point coefficient, in row order.
    pub samples: Vec<f64>,
    /// Per-cluster bands, by ascending cluster id.
    pub bands: Vec<SilhouetteBand>,
    /// Top of the layout: where the band after the last one would start.
    pub y_max: usize,
}

impl SilhouetteReport {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.bands.len()
    }
}

fn check(data: &[Vec<f64>], partition: &Partition) -> Result<Vec<usize>> {
    if partition.k() < 2 {
        return Err(Error::SilhouetteUndefined {
            n_clusters: partition.k(),
        });
    }
    util::validate_points(data)?;
    if data.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "data",
            message: "values must be finite",
        });
    }
    if data.len() != partition.len() {
        return Err(Error::RowCountMismatch {
            expected: data.len(),
            found: partition.len(),
        });
    }
    let sizes = partition.sizes();
    if let Some(cluster) = sizes.iter().position(|&s| s == 0) {
        return Err(Error::EmptyCluster { cluster });
    }
    Ok(sizes)
}

/// Per-point silhouette coefficients, in row order.
///
/// Fails with [`Error::SilhouetteUndefined`] when `k < 2` and with
/// [`Error::EmptyCluster`] when some id in `0..k` has no members.
pub fn silhouette_samples(data: &[Vec<f64>], partition: &Partition) -> Result<Vec<f64>> {
    let sizes = check(data, partition)?;
    let labels = partition.labels();
    let k = partition.k();

    let mut out = Vec::with_capacity(data.len());
    let mut sums = vec![0.0f64; k];
    for (i, point) in data.iter().enumerate() {
        let own = labels[i];
        if sizes[own] == 1 {
            out.push(0.0);
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for (j, other) in data.iter().enumerate() {
            if j != i {
                sums[labels[j]] += euclidean(point, other);
            }
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        let s = if denom > 0.0 { (b - a) / denom } else { 0.0 };
        out.push(s);
    }
    Ok(out)
}

/// Mean silhouette coefficient over all points.
pub fn silhouette_score(data: &[Vec<f64>], partition: &Partition) -> Result<f64> {
    let samples = silhouette_samples(data, partition)?;
    Ok(mean(&samples))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Group coefficients by cluster, sort each group ascending, and assign
/// gapped vertical offsets. Returns the bands and the final offset.
pub fn silhouette_bands(samples: &[f64], partition: &Partition) -> (Vec<SilhouetteBand>, usize) {
    let mut grouped: Vec<Vec<f64>> = vec![Vec::new(); partition.k()];
    for (&s, &label) in samples.iter().zip(partition.labels()) {
        grouped[label].push(s);
    }

    let mut bands = Vec::with_capacity(grouped.len());
    let mut y_lower = BAND_START;
    for (cluster, mut values) in grouped.into_iter().enumerate() {
        values.sort_by(f64::total_cmp);
        let y_upper = y_lower + values.len();
        bands.push(SilhouetteBand {
            cluster,
            y_lower,
            y_upper,
            values,
        });
        y_lower = y_upper + BAND_GAP;
    }
    (bands, y_lower)
}

/// Full report: per-point coefficients, their mean, and the band layout.
pub fn analyze(data: &[Vec<f64>], partition: &Partition) -> Result<SilhouetteReport> {
    let samples = silhouette_samples(data, partition)?;
    let mean = mean(&samples);
    let (bands, y_max) = silhouette_bands(&samples, partition);
    debug!(k = partition.k(), n = samples.len(), mean, "silhouette");
    Ok(SilhouetteReport {
        mean,
        samples,
        bands,
        y_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test]
    fn test_known_coefficients() {
        let data = column(&[0.0, 1.0, 10.0, 11.0]);
        let p = Partition::from_labels(vec![0, 0, 1, 1], 2).unwrap();
        let s = silhouette_samples(&data, &p).unwrap();

        // a = 1, b = mean(10, 11) = 10.5
        assert!((s[0] - 9.5 / 10.5).abs() < 1e-12);
        // a = 1, b = mean(9, 10) = 9.5
        assert!((s[1] - 8.5 / 9.5).abs() < 1e-12);
        assert!((s[2] - 8.5 / 9.5).abs() < 1e-12);
        assert!((s[3] - 9.5 / 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_singleton_is_zero() {
        let data = column(&[0.0, 1.0, 50.0]);
        let p = Partition::from_labels(vec![0, 0, 1], 2).unwrap();
        let s = silhouette_samples(&data, &p).unwrap();
        assert_eq!(s[2], 0.0);
        assert!(s[0] > 0.0);
    }

    #[test]
    fn test_negative_for_misassigned_point() {
        let data = column(&[0.0, 0.1, 10.0, 0.2]);
        let p = Partition::from_labels(vec![0, 0, 1, 1], 2).unwrap();
        let s = silhouette_samples(&data, &p).unwrap();
        assert!(s[3] < 0.0);
        assert!(s.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_coincident_points_are_finite() {
        let data = column(&[1.0, 1.0, 1.0, 1.0]);
        let p = Partition::from_labels(vec![0, 0, 1, 1], 2).unwrap();
        let s = silhouette_samples(&data, &p).unwrap();
        assert_eq!(s, vec![0.0; 4]);
    }

    #[test]
    fn test_mean_matches_samples() {
        let data = column(&[0.0, 1.0, 2.0, 7.0, 8.0, 20.0]);
        let p = Partition::from_labels(vec![0, 0, 0, 1, 1, 2], 3).unwrap();
        let report = analyze(&data, &p).unwrap();
        let expected = report.samples.iter().sum::<f64>() / 6.0;
        assert!((report.mean - expected).abs() < 1e-12);
        assert!((silhouette_score(&data, &p).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_for_one_cluster() {
        let data = column(&[0.0, 1.0]);
        let p = Partition::from_labels(vec![0, 0], 1).unwrap();
        let err = analyze(&data, &p).unwrap_err();
        assert!(matches!(err, Error::SilhouetteUndefined { n_clusters: 1 }));
        assert!(err.to_string().contains("undefined for k=1"));
    }

    #[test]
    fn test_empty_cluster_rejected() {
        let data = column(&[0.0, 1.0, 2.0]);
        let p = Partition::from_labels(vec![0, 2, 2], 3).unwrap();
        assert!(matches!(
            silhouette_samples(&data, &p),
            Err(Error::EmptyCluster { cluster: 1 })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let data = column(&[0.0, 1.0, 2.0]);
        let p = Partition::from_labels(vec![0, 1], 2).unwrap();
        assert!(matches!(
            silhouette_samples(&data, &p),
            Err(Error::RowCountMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let p = Partition::from_labels(vec![0, 0, 1, 1], 2).unwrap();
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let data = column(&[0.0, 1.0, bad, 5.0]);
            assert!(matches!(
                analyze(&data, &p),
                Err(Error::InvalidParameter { name: "data", .. })
            ));
        }
    }

    #[test]
    fn test_band_layout() {
        let samples = vec![0.5, 0.1, 0.9, 0.3, 0.2, 0.7];
        let p = Partition::from_labels(vec![1, 0, 1, 2, 1, 2], 3).unwrap();
        let (bands, y_max) = silhouette_bands(&samples, &p);

        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].cluster, 0);
        assert_eq!((bands[0].y_lower, bands[0].y_upper), (10, 11));
        assert_eq!(bands[0].values, vec![0.1]);

        assert_eq!((bands[1].y_lower, bands[1].y_upper), (21, 24));
        assert_eq!(bands[1].values, vec![0.2, 0.5, 0.9]);

        assert_eq!((bands[2].y_lower, bands[2].y_upper), (34, 36));
        assert_eq!(bands[2].values, vec![0.3, 0.7]);

        assert_eq!(y_max, 46);
    }
}
