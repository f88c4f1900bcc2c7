//! Configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! dir = "data"
//! format = "columnar"
//! normalized = "normalized_ACC_INTAKES_OUTCOMES"
//! standardized = "scaled_ACC_INTAKES_OUTCOMES"
//!
//! [clustering]
//! seed = 42
//! max_iter = 300
//! n_init = 10
//! tolerance = 1e-4
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cluster::{Kmeans, DEFAULT_SEED};
use crate::dataset::Format;
use crate::error::{Error, Result};
use crate::features::DatasetVariant;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub clustering: ClusteringConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clustering.max_iter == 0 {
            return Err(Error::Config("clustering.max_iter must be greater than 0".into()));
        }
        if self.clustering.n_init == 0 {
            return Err(Error::Config("clustering.n_init must be greater than 0".into()));
        }
        let tol = self.clustering.tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(Error::Config(
                "clustering.tolerance must be finite and non-negative".into(),
            ));
        }
        if self.data.normalized.is_empty() || self.data.standardized.is_empty() {
            return Err(Error::Config("data dataset names must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub format: Format,
    /// Dataset holding the min-max normalized encoding.
    pub normalized: String,
    /// Dataset holding the z-score standardized encoding.
    pub standardized: String,
}

impl DataConfig {
    pub fn dataset_name(&self, variant: DatasetVariant) -> &str {
        match variant {
            DatasetVariant::Normalized => &self.normalized,
            DatasetVariant::Standardized => &self.standardized,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            format: Format::Columnar,
            normalized: "normalized_ACC_INTAKES_OUTCOMES".to_string(),
            standardized: "scaled_ACC_INTAKES_OUTCOMES".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub seed: u64,
    pub max_iter: usize,
    pub n_init: usize,
    /// Centroid-shift tolerance, relative to the mean feature variance.
    pub tolerance: f64,
}

impl ClusteringConfig {
    /// A K-means clusterer for `k` with these settings.
    pub fn kmeans(&self, k: usize) -> Kmeans {
        Kmeans::new(k)
            .with_seed(self.seed)
            .with_max_iter(self.max_iter)
            .with_n_init(self.n_init)
            .with_tol(self.tolerance)
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_iter: 300,
            n_init: 10,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(
            config.data.dataset_name(DatasetVariant::Standardized),
            "scaled_ACC_INTAKES_OUTCOMES"
        );
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            [data]
            dir = "/srv/shelter"
            format = "csv"

            [clustering]
            n_init = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.data.dir, PathBuf::from("/srv/shelter"));
        assert_eq!(config.data.format, Format::Csv);
        assert_eq!(config.clustering.n_init, 3);
        assert_eq!(config.clustering.max_iter, 300);
    }

    #[test]
    fn test_validation() {
        assert!(Config::from_toml("[clustering]\nmax_iter = 0").is_err());
        assert!(Config::from_toml("[clustering]\nn_init = 0").is_err());
        assert!(Config::from_toml("[clustering]\ntolerance = -1.0").is_err());
        assert!(Config::from_toml("[data]\nnormalized = \"\"").is_err());
        assert!(matches!(
            Config::from_toml("[data]\nformat = \"parquet\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("corral.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().logging.level, "debug");
        assert!(Config::from_file(&tmp.path().join("missing.toml")).is_err());
    }
}
