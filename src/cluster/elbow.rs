//! Elbow curve: inertia as a function of k.
//!
//! The range is fixed at `k = 1..=10` and every fit uses the same seed, so
//! curves computed for different dataset variants are directly comparable.
//! Picking the elbow is left to whoever reads the curve.

use serde::Serialize;
use tracing::{debug, warn};

use super::kmeans::Kmeans;
use crate::error::Result;

/// Largest k on the elbow curve.
pub const ELBOW_MAX_K: usize = 10;

/// One point of the elbow curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

/// Fit K-means for every `k` in `1..=ELBOW_MAX_K` and record the inertia.
///
/// `template` supplies everything but `k` (seed, restarts, iteration cap).
/// The first failing fit aborts the whole curve; with fewer than ten rows
/// that is `InvalidClusterCount` at `k = n + 1`.
pub fn elbow_curve(data: &[Vec<f64>], template: &Kmeans) -> Result<Vec<ElbowPoint>> {
    let mut curve = Vec::with_capacity(ELBOW_MAX_K);
    for k in 1..=ELBOW_MAX_K {
        let fit = template.clone().with_k(k).fit(data)?;
        debug!(k, inertia = fit.inertia, "elbow point");
        curve.push(ElbowPoint {
            k,
            inertia: fit.inertia,
        });
    }

    if curve.windows(2).any(|w| w[1].inertia > w[0].inertia * (1.0 + 1e-9)) {
        warn!("elbow curve is not monotonically non-increasing");
    }
    Ok(curve)
}
