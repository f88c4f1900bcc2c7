//! One full, synchronous recomputation per user interaction.
//!
//! load → feature matrix → elbow curve → K-means at `k` → silhouette →
//! augmented table → aggregate tables. Nothing is carried over between runs
//! except the dataset store's shared, read-only tables; the first failure
//! aborts the run.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{self, ClusterSize, Distribution, GroupTable};
use crate::cluster::{elbow_curve, silhouette, ElbowPoint, KmeansFit, SilhouetteReport};
use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::error::{Error, Result};
use crate::features::{
    resolve_features, DatasetVariant, FeatureGroup, RAW_AGE_UPON_OUTCOME, RAW_TIME_IN_SHELTER,
};
use crate::join::{original_name, AugmentedTable, JoinKey};
use crate::table::{FeatureMatrix, Table};

/// Smallest cluster count accepted from callers.
pub const K_MIN: usize = 2;

/// Largest cluster count accepted from callers.
pub const K_MAX: usize = 10;

const MIX_BREED_CATEGORIES: &[(f64, &str)] = &[(0.0, "Purebred"), (1.0, "Mixed breed")];

/// Parameters of one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub variant: DatasetVariant,
    pub groups: Vec<FeatureGroup>,
    /// Cluster count for the main clustering.
    pub k: usize,
    /// Cluster count for the silhouette diagnostic.
    pub silhouette_k: usize,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            variant: DatasetVariant::Standardized,
            groups: FeatureGroup::ALL.to_vec(),
            k: 3,
            silhouette_k: 4,
        }
    }
}

/// Everything the charting layer draws for one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub variant: DatasetVariant,
    pub features: Vec<String>,
    /// Rows that entered clustering.
    pub n_rows: usize,
    pub elbow: Vec<ElbowPoint>,
    pub k: usize,
    pub inertia: f64,
    pub silhouette: SilhouetteReport,
    pub cluster_sizes: Vec<ClusterSize>,
    pub outcome_types: GroupTable,
    pub intake_conditions: GroupTable,
    pub animal_types: GroupTable,
    pub mix_breed: GroupTable,
    pub time_in_shelter: Vec<Distribution>,
    pub age_upon_outcome: Vec<Distribution>,
    #[serde(skip)]
    pub augmented: AugmentedTable,
}

fn check_k(name: &'static str, k: usize) -> Result<()> {
    if (K_MIN..=K_MAX).contains(&k) {
        Ok(())
    } else {
        warn!(parameter = name, k, "cluster count out of range");
        Err(Error::ClusterCountOutOfRange {
            requested: k,
            min: K_MIN,
            max: K_MAX,
        })
    }
}

/// Owns the dataset store and clustering settings.
#[derive(Debug)]
pub struct Session {
    config: Config,
    store: DatasetStore,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let store = DatasetStore::new(config.data.dir.clone(), config.data.format);
        Self { config, store }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Shared handle to the table backing `variant`.
    pub fn table(&self, variant: DatasetVariant) -> Result<Arc<Table>> {
        self.store.load(self.config.data.dataset_name(variant))
    }

    fn features(
        &self,
        variant: DatasetVariant,
        groups: &[FeatureGroup],
    ) -> Result<(Arc<Table>, FeatureMatrix)> {
        let columns = resolve_features(groups, variant)?;
        let table = self.table(variant)?;
        let features = table.feature_matrix(&columns)?;
        Ok((table, features))
    }

    /// Inertia for k = 1..=10 over the selected features.
    pub fn elbow(
        &self,
        variant: DatasetVariant,
        groups: &[FeatureGroup],
    ) -> Result<Vec<ElbowPoint>> {
        let (_, features) = self.features(variant, groups)?;
        elbow_curve(&features.rows, &self.config.clustering.kmeans(1))
    }

    /// A single seeded K-means fit at `k`.
    pub fn cluster(
        &self,
        variant: DatasetVariant,
        groups: &[FeatureGroup],
        k: usize,
    ) -> Result<(FeatureMatrix, KmeansFit)> {
        check_k("k", k)?;
        let (_, features) = self.features(variant, groups)?;
        let fit = self.config.clustering.kmeans(k).fit(&features.rows)?;
        Ok((features, fit))
    }

    /// Silhouette report for a fresh fit at `k`.
    pub fn silhouette(
        &self,
        variant: DatasetVariant,
        groups: &[FeatureGroup],
        k: usize,
    ) -> Result<SilhouetteReport> {
        let (features, fit) = self.cluster(variant, groups, k)?;
        silhouette::analyze(&features.rows, &fit.partition())
    }

    /// The full interaction.
    pub fn run(&self, request: &Request) -> Result<Report> {
        check_k("k", request.k)?;
        check_k("silhouette_k", request.silhouette_k)?;

        let (table, features) = self.features(request.variant, &request.groups)?;
        info!(
            variant = %request.variant,
            features = features.columns.len(),
            rows = features.n_rows(),
            k = request.k,
            silhouette_k = request.silhouette_k,
            "clustering run"
        );

        let clustering = &self.config.clustering;
        let elbow = elbow_curve(&features.rows, &clustering.kmeans(1))?;
        let fit = clustering.kmeans(request.k).fit(&features.rows)?;
        let partition = fit.partition();

        let silhouette = if request.silhouette_k == request.k {
            silhouette::analyze(&features.rows, &partition)?
        } else {
            let own = clustering.kmeans(request.silhouette_k).fit(&features.rows)?;
            silhouette::analyze(&features.rows, &own.partition())?
        };

        // The raw columns live unmodified in the same dataset, row for row.
        let augmented = AugmentedTable::new(&table, &features, &partition)?.attach_raw(
            &table,
            &[RAW_TIME_IN_SHELTER, RAW_AGE_UPON_OUTCOME],
            &JoinKey::Position,
        )?;

        let variant = request.variant;
        let report = Report {
            variant,
            n_rows: features.n_rows(),
            elbow,
            k: request.k,
            inertia: fit.inertia,
            silhouette,
            cluster_sizes: aggregate::cluster_sizes(&augmented),
            outcome_types: aggregate::sum_by_cluster(
                &augmented,
                &FeatureGroup::OutcomeType.columns(variant),
            )?,
            intake_conditions: aggregate::sum_by_cluster(
                &augmented,
                &FeatureGroup::IntakeCondition.columns(variant),
            )?,
            animal_types: aggregate::sum_by_cluster(
                &augmented,
                &FeatureGroup::AnimalType.columns(variant),
            )?,
            mix_breed: aggregate::count_by_cluster_and_value(
                &augmented,
                "is_mix_breed",
                MIX_BREED_CATEGORIES,
            )?,
            time_in_shelter: aggregate::distribution_by_cluster(
                &augmented,
                &original_name(RAW_TIME_IN_SHELTER),
            )?,
            age_upon_outcome: aggregate::distribution_by_cluster(
                &augmented,
                &original_name(RAW_AGE_UPON_OUTCOME),
            )?,
            features: features.columns,
            augmented,
        };

        info!(
            inertia = report.inertia,
            silhouette = report.silhouette.mean,
            clusters = report.cluster_sizes.len(),
            "clustering run finished"
        );
        Ok(report)
    }
}
