use thiserror::Error;

/// Errors returned by the clustering pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Requested cluster count is outside the range exposed to callers.
    #[error("cluster count {requested} outside allowed range {min}..={max}")]
    ClusterCountOutOfRange {
        /// Requested number of clusters.
        requested: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// No columns were selected for clustering.
    #[error("feature subset is empty")]
    EmptyFeatureSubset,

    /// A referenced column does not exist in the table.
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    /// A feature-group identifier is not recognized.
    #[error("unknown feature group {0:?}")]
    UnknownFeatureGroup(String),

    /// A referenced column exists but holds non-numeric values.
    #[error("column {0:?} is not numeric")]
    NonNumericColumn(String),

    /// Silhouette needs at least two clusters.
    #[error("silhouette is undefined for k={n_clusters}")]
    SilhouetteUndefined {
        /// Number of clusters in the partition.
        n_clusters: usize,
    },

    /// A cluster id in `0..k` has no members.
    #[error("cluster {cluster} is empty")]
    EmptyCluster {
        /// The empty cluster id.
        cluster: usize,
    },

    /// Neither the columnar cache nor the delimited source exists.
    #[error("dataset {name:?} not found in {dir}")]
    DatasetNotFound {
        /// Logical dataset name.
        name: String,
        /// Directory that was searched.
        dir: String,
    },

    /// Two tables that must be row-aligned are not.
    #[error("row count mismatch: expected {expected}, found {found}")]
    RowCountMismatch {
        /// Rows in the table being joined onto.
        expected: usize,
        /// Rows found in the other table.
        found: usize,
    },

    /// A key value has no matching row in the source table.
    #[error("join key {key} not present in source column {column:?}")]
    MissingJoinKey {
        /// Key column.
        column: String,
        /// Unmatched key value.
        key: String,
    },

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Delimited-text parse error.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Columnar cache could not be encoded or decoded.
    #[error("columnar cache: {0}")]
    Cache(#[from] bincode::Error),

    /// Configuration could not be parsed or failed validation.
    #[error("config: {0}")]
    Config(String),

    /// JSON encoding of a data product failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
