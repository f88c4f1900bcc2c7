use corral::aggregate::sum_by_cluster;
use corral::cluster::silhouette::{self, BAND_GAP, BAND_START};
use corral::cluster::{Clustering, Kmeans, Partition};
use corral::features::ColumnDescriptor;
use corral::{AugmentedTable, Column, Table};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_kmeans_all_assigned(
        data in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 1..20),
        k in 1usize..5
    ) {
        // Skip if k > n
        if k <= data.len() {
            let model = Kmeans::new(k).with_seed(42);
            let labels = model.fit_predict(&data).unwrap();

            prop_assert_eq!(labels.len(), data.len());
            for &l in &labels {
                prop_assert!(l < k);
            }
        }
    }

    #[test]
    fn prop_kmeans_deterministic(
        data in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 3), 4..25),
        k in 1usize..4,
        seed in any::<u64>()
    ) {
        let a = Kmeans::new(k).with_seed(seed).with_n_init(3).fit(&data).unwrap();
        let b = Kmeans::new(k).with_seed(seed).with_n_init(3).fit(&data).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_silhouette_bounded_and_mean_consistent(
        data in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 2), 4..30),
        k in 2usize..4
    ) {
        // Round-robin labels keep every cluster populated.
        let labels: Vec<usize> = (0..data.len()).map(|i| i % k).collect();
        let partition = Partition::from_labels(labels, k).unwrap();
        let report = silhouette::analyze(&data, &partition).unwrap();

        prop_assert_eq!(report.samples.len(), data.len());
        for &s in &report.samples {
            prop_assert!((-1.0..=1.0).contains(&s));
        }
        let mean = report.samples.iter().sum::<f64>() / data.len() as f64;
        prop_assert!((report.mean - mean).abs() < 1e-9);
    }

    #[test]
    fn prop_band_offsets(labels in prop::collection::vec(0usize..5, 1..40)) {
        let partition = Partition::from_labels(labels.clone(), 5).unwrap();
        let samples: Vec<f64> = (0..labels.len()).map(|i| ((i * 37) % 11) as f64 / 10.0 - 0.5).collect();
        let (bands, y_max) = silhouette::silhouette_bands(&samples, &partition);
        let sizes = partition.sizes();

        let mut expected_lower = BAND_START;
        for (i, band) in bands.iter().enumerate() {
            prop_assert_eq!(band.cluster, i);
            prop_assert_eq!(band.y_lower, expected_lower);
            prop_assert_eq!(band.values.len(), sizes[i]);
            prop_assert_eq!(band.y_upper - band.y_lower, sizes[i]);
            prop_assert!(band.values.windows(2).all(|w| w[0] <= w[1]));
            expected_lower += sizes[i] + BAND_GAP;
        }
        prop_assert_eq!(y_max, expected_lower);
    }

    #[test]
    fn prop_sums_are_conserved(
        rows in prop::collection::vec((0usize..4, any::<bool>(), any::<bool>()), 1..50)
    ) {
        let n = rows.len();
        let as_col = |f: fn(&(usize, bool, bool)) -> bool| {
            Column::Numeric(rows.iter().map(|r| Some(if f(r) { 1.0 } else { 0.0 })).collect())
        };
        let table = Table::from_columns(vec![
            ("x".into(), Column::Numeric(vec![Some(0.0); n])),
            ("a".into(), as_col(|r| r.1)),
            ("b".into(), as_col(|r| r.2)),
        ])
        .unwrap();
        let features = table.feature_matrix(&["x".into()]).unwrap();
        let partition = Partition::from_labels(rows.iter().map(|r| r.0).collect(), 4).unwrap();
        let aug = AugmentedTable::new(&table, &features, &partition).unwrap();

        let descriptors = vec![ColumnDescriptor::new("a", "A"), ColumnDescriptor::new("b", "B")];
        let grouped = sum_by_cluster(&aug, &descriptors).unwrap();

        let total_a = rows.iter().filter(|r| r.1).count() as f64;
        let total_b = rows.iter().filter(|r| r.2).count() as f64;
        prop_assert_eq!(grouped.column_total(0), total_a);
        prop_assert_eq!(grouped.column_total(1), total_b);
        prop_assert!(grouped.clusters.windows(2).all(|w| w[0] < w[1]));
    }
}
