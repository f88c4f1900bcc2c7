//! Clustering diagnostics for animal-shelter intake/outcome tables.
//!
//! `corral` loads a tabular dataset, runs K-means over a chosen feature
//! subset, and produces the data behind a clustering dashboard:
//! - the elbow curve (inertia for k = 1..=10)
//! - silhouette scores with a per-cluster banded layout
//! - the clustered rows with raw descriptive columns re-attached
//! - per-cluster sums, counts and distributions for charting
//!
//! The numerical core lives in [`cluster`] and works on plain `&[Vec<f64>]`
//! rows; [`pipeline::Session`] wires it to datasets on disk.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod join;
pub mod pipeline;
pub mod table;

pub use cluster::{
    elbow_curve, Clustering, ElbowPoint, Kmeans, KmeansFit, Partition, SilhouetteBand,
    SilhouetteReport,
};
pub use config::Config;
pub use dataset::{DatasetStore, Format};
pub use error::{Error, Result};
pub use features::{DatasetVariant, FeatureGroup};
pub use join::{AugmentedTable, JoinKey};
pub use pipeline::{Report, Request, Session};
pub use table::{Column, FeatureMatrix, Table};
