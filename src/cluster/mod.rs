//! Clustering and cluster diagnostics over dense numeric rows.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then move every centroid to the
//! mean of its points. Repeat until the assignment stops changing, the
//! centroids stop moving, or the iteration cap is hit.
//!
//! **Objective**: minimize within-cluster sum of squares (the inertia):
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Seeding is k-means++ from a fixed seed, so fits are reproducible.
//!
//! ## Elbow curve
//!
//! Inertia for `k = 1..=10`. Inertia generally falls as k grows; the "elbow" is
//! where it starts falling slowly.
//!
//! ## Silhouette
//!
//! Per-point separation score in `[-1, 1]`, plus a banded layout of each
//! cluster's sorted scores for plotting.
//!
//! ## Usage
//!
//! ```rust
//! use corral::cluster::{silhouette, Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let fit = Kmeans::new(2).fit(&data).unwrap();
//! let report = silhouette::analyze(&data, &fit.partition()).unwrap();
//! assert!(report.mean > 0.9);
//! ```

pub mod elbow;
mod kmeans;
mod partition;
pub mod silhouette;
mod traits;
pub(crate) mod util;

pub use elbow::{elbow_curve, ElbowPoint, ELBOW_MAX_K};
pub use kmeans::{Kmeans, KmeansFit, DEFAULT_SEED};
pub use partition::Partition;
pub use silhouette::{SilhouetteBand, SilhouetteReport, BAND_GAP, BAND_START};
pub use traits::Clustering;
