//! Integration test: cluster search, label reconciliation and forest search

use cytodx::data::{Dataset, Diagnosis, Sample};
use cytodx::error::CytodxError;
use cytodx::preprocessing::{FeaturePreparer, PreparedData};
use cytodx::selection::{
    reconcile_labels, ClusterModelSelector, ClusterSearchConfig, FeatureImportanceRanking, ForestModelSelector,
    ForestSearchConfig,
};
use cytodx::training::CovarianceType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Benign rows score low on every measurement, malignant rows high
fn cytology_dataset(n_per_class: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(2 * n_per_class);
    for _ in 0..n_per_class {
        let benign: Vec<f64> = (0..9).map(|_| rng.gen_range(1..=3u32) as f64).collect();
        samples.push(Sample::complete(&benign, 2));
        let malignant: Vec<f64> = (0..9).map(|_| rng.gen_range(6..=10u32) as f64).collect();
        samples.push(Sample::complete(&malignant, 4));
    }
    Dataset::with_standard_schema(samples).unwrap()
}

fn prepared(n_per_class: usize) -> PreparedData {
    FeaturePreparer::default()
        .prepare(&cytology_dataset(n_per_class, 7))
        .unwrap()
}

fn quick_cluster_search() -> ClusterSearchConfig {
    ClusterSearchConfig::default()
        .with_n_components(vec![2, 3])
        .with_n_init(2)
}

fn quick_forest_search() -> ForestSearchConfig {
    ForestSearchConfig::default()
        .with_n_estimators(vec![10, 20])
        .with_max_depth(vec![None, Some(4)])
        .with_min_samples_split(vec![2])
        .with_min_samples_leaf(vec![1, 2])
        .with_cv_folds(3)
}

#[test]
fn test_cluster_search_scores_every_configuration() {
    let data = prepared(40);
    let outcome = ClusterModelSelector::new(quick_cluster_search())
        .search(&data.features, &data.labels)
        .unwrap();

    assert_eq!(outcome.candidates.len() + outcome.failures.len(), 8);
    assert!(outcome.best.accuracy > 0.95, "accuracy = {}", outcome.best.accuracy);
    assert!(outcome
        .candidates
        .iter()
        .all(|c| c.accuracy <= outcome.best.accuracy));
    assert_eq!(outcome.assignments.len(), data.n_samples());

    // two well-separated groups populate at least two clusters, so both diagnostics are scored
    assert!(outcome.best.silhouette > 0.0);
    assert!(outcome.best.calinski_harabasz > 0.0);

    let ranked = outcome.ranked();
    assert_eq!(ranked[0].accuracy, outcome.best.accuracy);
}

#[test]
fn test_cluster_search_isolates_failing_configurations() {
    let data = prepared(10);
    // 500 components cannot be fit on 20 samples
    let config = quick_cluster_search()
        .with_n_components(vec![2, 500])
        .with_covariance_types(vec![CovarianceType::Diagonal, CovarianceType::Spherical]);

    let outcome = ClusterModelSelector::new(config)
        .search(&data.features, &data.labels)
        .unwrap();

    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.failures.iter().all(|f| f.config.n_components == 500));
    assert_eq!(outcome.best.config.n_components, 2);
}

#[test]
fn test_cluster_search_fails_when_nothing_fits() {
    let data = prepared(5);
    let config = quick_cluster_search().with_n_components(vec![50]);
    let result = ClusterModelSelector::new(config).search(&data.features, &data.labels);
    assert!(matches!(result, Err(CytodxError::TrainingError(_))));
}

#[test]
fn test_reconciled_map_covers_every_assigned_cluster() {
    let data = prepared(30);
    let outcome = ClusterModelSelector::new(quick_cluster_search())
        .search(&data.features, &data.labels)
        .unwrap();
    let map = reconcile_labels(&outcome.assignments, &data.labels).unwrap();

    for &cluster in &outcome.assignments {
        assert!(map.contains(cluster));
    }
    let diagnoses: Vec<Diagnosis> = map.iter().map(|(_, d)| d).collect();
    assert!(diagnoses.contains(&Diagnosis::Benign));
    assert!(diagnoses.contains(&Diagnosis::Malignant));
}

#[test]
fn test_forest_search_and_importance() {
    let data = prepared(30);
    let outcome = ForestModelSelector::new(quick_forest_search())
        .search(&data.features, &data.labels)
        .unwrap();

    assert_eq!(outcome.candidates.len(), 8);
    assert!(outcome.failures.is_empty());
    assert!(outcome.best.cv.mean_score > 0.95);
    assert_eq!(outcome.best.cv.n_folds, 3);
    assert!(outcome
        .candidates
        .iter()
        .all(|c| c.cv.mean_score <= outcome.best.cv.mean_score));
    assert_eq!(outcome.model.n_trees(), outcome.best.config.n_estimators);

    let importances = outcome.model.feature_importances().unwrap();
    let ranking = FeatureImportanceRanking::from_importances(&data.feature_names, importances).unwrap();
    assert_eq!(ranking.len(), 9);
    assert!(ranking.entries().iter().all(|e| e.importance >= 0.0));
    assert!((ranking.total() - 1.0).abs() < 1e-9);
    assert!(ranking
        .entries()
        .windows(2)
        .all(|w| w[0].importance >= w[1].importance));
}

#[test]
fn test_forest_search_is_reproducible() {
    let data = prepared(20);
    let first = ForestModelSelector::new(quick_forest_search())
        .search(&data.features, &data.labels)
        .unwrap();
    let second = ForestModelSelector::new(quick_forest_search().with_parallel(false))
        .search(&data.features, &data.labels)
        .unwrap();

    assert_eq!(first.best.config, second.best.config);
    assert_eq!(first.best.cv.scores, second.best.cv.scores);
}

#[test]
fn test_search_rejects_label_mismatch() {
    let data = prepared(5);
    let result = ForestModelSelector::new(quick_forest_search()).search(&data.features, &data.labels[1..]);
    assert!(matches!(result, Err(CytodxError::ShapeError { .. })));
}
