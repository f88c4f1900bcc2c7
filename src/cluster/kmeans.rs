//! K-means: Lloyd iterations with k-means++ seeding.
//!
//! # Objective
//!
//! Minimize the within-cluster sum of squares (the *inertia*):
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! # Determinism
//!
//! Every random choice (k-means++ seeding of each restart) is drawn from a
//! single `StdRng` seeded with [`Kmeans::with_seed`]. Two fits with the same
//! configuration over the same data return identical labels, centroids and
//! inertia. Ties in the nearest-centroid search resolve to the lowest
//! centroid index.
//!
//! # Restarts
//!
//! `n_init` independent seedings are run back to back; the fit with the
//! lowest inertia wins (earliest on ties).
//!
//! # Empty clusters
//!
//! If an update step leaves a centroid without members, it is moved onto the
//! point currently farthest from its own centroid. With duplicate-heavy data
//! a cluster can still end up empty; callers that need every id populated
//! (silhouette) check for that themselves.

use rand::prelude::*;
use tracing::debug;

use super::partition::Partition;
use super::traits::Clustering;
use super::util::{self, squared_euclidean};
use crate::error::{Error, Result};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// K-means clusterer configuration.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    tol: f64,
    n_init: usize,
    seed: u64,
}

/// Result of a K-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Final centroids, `k` rows of the input dimensionality.
    pub centroids: Vec<Vec<f64>>,
    /// Cluster id per input row, in input order.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each point to its assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations run by the winning restart.
    pub n_iter: usize,
}

impl KmeansFit {
    /// Number of clusters the fit was run with.
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Labels as an immutable partition.
    pub fn partition(&self) -> Partition {
        Partition::new(self.labels.clone(), self.k())
    }
}

impl Kmeans {
    /// Create a K-means clusterer for `k` clusters.
    ///
    /// Defaults: `max_iter = 300`, `tol = 1e-4`, `n_init = 10`, `seed = 42`.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            seed: DEFAULT_SEED,
        }
    }

    /// Set the number of clusters.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the iteration cap per restart.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance, relative to the mean per-feature variance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of seeded restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self, data: &[Vec<f64>]) -> Result<usize> {
        let d = util::validate_points(data)?;
        if self.k == 0 || self.k > data.len() {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: data.len(),
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "values must be finite",
            });
        }
        Ok(d)
    }

    /// Fit and return centroids, labels and inertia.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KmeansFit> {
        let d = self.validate(data)?;
        let tol = self.tol * mean_variance(data, d);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best: Option<KmeansFit> = None;
        for run in 0..self.n_init {
            let init = kmeans_plus_plus(data, self.k, &mut rng);
            let fit = lloyd(data, init, self.max_iter, tol);
            debug!(run, inertia = fit.inertia, n_iter = fit.n_iter, "kmeans restart");
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        // n_init >= 1 is validated above.
        let fit = best.ok_or(Error::EmptyInput)?;
        debug!(
            k = self.k,
            n = data.len(),
            dim = d,
            inertia = fit.inertia,
            n_iter = fit.n_iter,
            "kmeans fit"
        );
        Ok(fit)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

fn mean_variance(data: &[Vec<f64>], d: usize) -> f64 {
    let n = data.len() as f64;
    let mut total = 0.0;
    for j in 0..d {
        let mean = data.iter().map(|p| p[j]).sum::<f64>() / n;
        total += data.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / n;
    }
    total / d as f64
}

/// k-means++ seeding: first centroid uniform, then D²-weighted.
fn kmeans_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    centroids.push(data[rng.random_range(0..n)].clone());

    let mut closest: Vec<f64> = data
        .iter()
        .map(|p| squared_euclidean(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = closest.iter().rposition(|&w| w > 0.0).unwrap_or(n - 1);
            for (i, &w) in closest.iter().enumerate() {
                acc += w;
                if acc > target {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.random_range(0..n)
        };

        let c = data[next].clone();
        for (i, p) in data.iter().enumerate() {
            let dist = squared_euclidean(p, &c);
            if dist < closest[i] {
                closest[i] = dist;
            }
        }
        centroids.push(c);
    }
    centroids
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    (best, best_dist)
}

fn assign(data: &[Vec<f64>], centroids: &[Vec<f64>], labels: &mut [usize]) -> (bool, f64) {
    let mut changed = false;
    let mut inertia = 0.0;
    for (i, point) in data.iter().enumerate() {
        let (c, dist) = nearest(point, centroids);
        if labels[i] != c {
            labels[i] = c;
            changed = true;
        }
        inertia += dist;
    }
    (changed, inertia)
}

fn update(data: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = centroids.len();
    let d = centroids[0].len();
    let mut sums = vec![vec![0.0f64; d]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(point) {
            *s += v;
        }
    }

    let mut next = centroids.to_vec();
    let mut empty = Vec::new();
    for c in 0..k {
        if counts[c] == 0 {
            empty.push(c);
            continue;
        }
        let n = counts[c] as f64;
        next[c] = sums[c].iter().map(|s| s / n).collect();
    }

    if !empty.is_empty() {
        // Relocate empty centroids onto the points worst served by their own centroid.
        let mut far: Vec<(usize, f64)> = data
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (p, &l))| (i, squared_euclidean(p, &next[l])))
            .collect();
        far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for (c, (i, _)) in empty.into_iter().zip(far) {
            next[c] = data[i].clone();
        }
    }
    next
}

fn lloyd(data: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KmeansFit {
    let mut labels = vec![usize::MAX; data.len()];
    let mut n_iter = 0;

    for iter in 1..=max_iter {
        n_iter = iter;
        let (changed, _) = assign(data, &centroids, &mut labels);
        if !changed && iter > 1 {
            break;
        }
        let next = update(data, &labels, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(&next)
            .map(|(a, b)| squared_euclidean(a, b))
            .sum();
        centroids = next;
        if shift <= tol {
            break;
        }
    }

    // Labels and inertia are always reported against the final centroids.
    let (_, inertia) = assign(data, &centroids, &mut labels);
    KmeansFit {
        centroids,
        labels,
        inertia,
        n_iter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 4.9],
            vec![4.9, 5.1],
            vec![10.0, 0.0],
            vec![10.1, 0.1],
            vec![9.9, -0.1],
        ]
    }

    #[test]
    fn test_kmeans_three_blobs() {
        let data = three_blobs();
        let labels = Kmeans::new(3).fit_predict(&data).unwrap();
        for chunk in labels.chunks(3) {
            assert_eq!(chunk[0], chunk[1]);
            assert_eq!(chunk[1], chunk[2]);
        }
        assert_ne!(labels[0], labels[3]);
        assert_ne!(labels[3], labels[6]);
        assert_ne!(labels[0], labels[6]);
    }

    #[test]
    fn test_kmeans_one_dimensional_pairs() {
        let data: Vec<Vec<f64>> = [0.0, 0.0, 1.0, 1.0, 10.0, 10.0]
            .iter()
            .map(|&v| vec![v])
            .collect();

        let fit = Kmeans::new(3).fit(&data).unwrap();
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[2], fit.labels[3]);
        assert_eq!(fit.labels[4], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[2]);
        assert_ne!(fit.labels[2], fit.labels[4]);
        assert!(fit.inertia.abs() < 1e-12);

        let fit2 = Kmeans::new(2).fit(&data).unwrap();
        assert!(fit2.inertia > 0.0);
    }

    #[test]
    fn test_kmeans_deterministic() {
        let data = three_blobs();
        let a = Kmeans::new(4).with_seed(7).fit(&data).unwrap();
        let b = Kmeans::new(4).with_seed(7).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kmeans_single_cluster_inertia() {
        let data = vec![vec![0.0], vec![2.0], vec![4.0]];
        let fit = Kmeans::new(1).fit(&data).unwrap();
        assert_eq!(fit.labels, vec![0, 0, 0]);
        assert!((fit.centroids[0][0] - 2.0).abs() < 1e-12);
        assert!((fit.inertia - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data = vec![vec![0.0], vec![5.0], vec![9.0]];
        let fit = Kmeans::new(3).fit(&data).unwrap();
        let mut labels = fit.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_kmeans_invalid_inputs() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            Kmeans::new(3).fit(&data),
            Err(Error::InvalidClusterCount { requested: 3, n_items: 2 })
        ));
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(Kmeans::new(1).with_max_iter(0).fit(&data).is_err());
        assert!(Kmeans::new(1).with_n_init(0).fit(&data).is_err());
        assert!(matches!(Kmeans::new(1).fit(&[]), Err(Error::EmptyInput)));

        let ragged = vec![vec![0.0, 0.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new(1).fit(&ragged),
            Err(Error::DimensionMismatch { .. })
        ));

        let nan = vec![vec![0.0], vec![f64::NAN]];
        assert!(Kmeans::new(1).fit(&nan).is_err());
    }

    #[test]
    fn test_kmeans_duplicate_points() {
        let data = vec![vec![1.0, 1.0]; 5];
        let fit = Kmeans::new(2).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 5);
        assert!(fit.inertia.abs() < 1e-12);
    }
}
