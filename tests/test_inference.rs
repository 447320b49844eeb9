//! Integration test: diagnosis engine over trained artifacts

use cytodx::config::PipelineConfig;
use cytodx::data::{Dataset, Diagnosis, Sample};
use cytodx::error::CytodxError;
use cytodx::export::{ArtifactStore, ModelArtifacts};
use cytodx::inference::{BatchSummary, DiagnosisEngine, BENIGN_ADVICE, MALIGNANT_ADVICE};
use cytodx::pipeline::TrainingPipeline;
use cytodx::selection::{ClusterMap, ClusterSearchConfig, ForestSearchConfig};
use std::collections::BTreeMap;

const BENIGN: [f64; 9] = [1.0; 9];
const MALIGNANT: [f64; 9] = [10.0; 9];

/// 50 identical benign rows and 50 identical malignant rows
fn extreme_dataset() -> Dataset {
    let mut samples = Vec::with_capacity(100);
    samples.extend((0..50).map(|_| Sample::complete(&BENIGN, 2)));
    samples.extend((0..50).map(|_| Sample::complete(&MALIGNANT, 4)));
    Dataset::with_standard_schema(samples).unwrap()
}

fn quick_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_cluster_search(
            ClusterSearchConfig::default()
                .with_n_components(vec![2])
                .with_n_init(2),
        )
        .with_forest_search(
            ForestSearchConfig::default()
                .with_n_estimators(vec![10, 25])
                .with_max_depth(vec![None])
                .with_min_samples_split(vec![2])
                .with_min_samples_leaf(vec![1]),
        )
}

fn trained_artifacts() -> ModelArtifacts {
    TrainingPipeline::new(quick_config())
        .run(&extreme_dataset())
        .unwrap()
        .0
}

fn engine() -> DiagnosisEngine {
    DiagnosisEngine::new(trained_artifacts()).unwrap()
}

#[test]
fn test_extreme_samples_diagnosed_confidently() {
    let engine = engine();

    let benign = engine.diagnose_one(&BENIGN).unwrap();
    assert_eq!(benign.diagnosis, Diagnosis::Benign);
    assert!(benign.confidence > 0.9, "confidence = {}", benign.confidence);

    let malignant = engine.diagnose_one(&MALIGNANT).unwrap();
    assert_eq!(malignant.diagnosis, Diagnosis::Malignant);
    assert!(malignant.confidence > 0.9, "confidence = {}", malignant.confidence);
    assert_ne!(benign.cluster, malignant.cluster);
}

#[test]
fn test_wrong_feature_count_rejected() {
    let engine = engine();
    assert!(matches!(engine.diagnose_one(&[1.0; 8]), Err(CytodxError::InvalidInput(_))));
    assert!(matches!(engine.recommend(&[1.0; 10]), Err(CytodxError::InvalidInput(_))));

    match engine.diagnose_one(&[1.0; 8]) {
        Err(CytodxError::InvalidInput(msg)) => {
            assert!(msg.contains('9') && msg.contains('8'), "message = {}", msg)
        }
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_non_finite_input_rejected() {
    let engine = engine();
    let mut features = BENIGN;
    features[3] = f64::NAN;
    assert!(matches!(engine.diagnose_one(&features), Err(CytodxError::InvalidInput(_))));
    features[3] = f64::INFINITY;
    assert!(matches!(engine.recommend(&features), Err(CytodxError::InvalidInput(_))));
}

#[test]
fn test_overflowing_input_rejected_not_defaulted() {
    let engine = engine();
    for v in [1e200, -1e200] {
        match engine.diagnose_one(&[v; 9]) {
            Err(CytodxError::InvalidInput(msg)) => assert!(msg.contains("overflow"), "message = {}", msg),
            other => panic!("expected InvalidInput for {}, got {:?}", v, other),
        }
    }
    assert!(matches!(
        engine.diagnose_batch(&[BENIGN.to_vec(), vec![1e200; 9]]),
        Err(CytodxError::InvalidInput(_))
    ));
}

#[test]
fn test_batch_with_one_short_row_fails_wholesale() {
    let engine = engine();
    let mut rows = vec![BENIGN.to_vec(); 5];
    rows.insert(3, vec![1.0; 8]);
    rows.push(MALIGNANT.to_vec());

    match engine.diagnose_batch(&rows) {
        Err(CytodxError::InvalidInput(msg)) => assert!(msg.starts_with("row 3"), "message = {}", msg),
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_empty_batch_rejected() {
    assert!(matches!(engine().diagnose_batch(&[]), Err(CytodxError::InvalidInput(_))));
}

#[test]
fn test_repeated_batch_gives_identical_results() {
    let engine = engine();
    let sample = vec![3.0, 2.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 1.0];
    let results = engine.diagnose_batch(&vec![sample.clone(); 32]).unwrap();

    assert_eq!(results.len(), 32);
    assert!(results.iter().all(|r| *r == results[0]));
    assert_eq!(results[0], engine.diagnose_one(&sample).unwrap());
}

#[test]
fn test_batch_matches_single_and_summary_counts() {
    let engine = engine();
    let rows = vec![BENIGN.to_vec(), MALIGNANT.to_vec(), BENIGN.to_vec()];
    let results = engine.diagnose_batch(&rows).unwrap();

    for (row, result) in rows.iter().zip(&results) {
        assert_eq!(*result, engine.diagnose_one(row).unwrap());
    }
    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.total_patients, 3);
    assert_eq!(summary.benign, 2);
    assert_eq!(summary.malignant, 1);
}

#[test]
fn test_confidence_bounds() {
    let engine = engine();
    let k = engine.artifacts().cluster_model.n_components as f64;
    for v in [1.0, 2.5, 4.0, 5.5, 7.0, 8.5, 10.0] {
        let features = [v; 9];
        let diagnosis = engine.diagnose_one(&features).unwrap();
        assert!(diagnosis.confidence >= 1.0 / k - 1e-12 && diagnosis.confidence <= 1.0 + 1e-12);

        let recommendation = engine.recommend(&features).unwrap();
        assert!(recommendation.confidence >= 0.5 && recommendation.confidence <= 1.0 + 1e-12);
    }
}

#[test]
fn test_recommendation_templates() {
    let engine = engine();

    let malignant = engine.recommend(&MALIGNANT).unwrap();
    assert_eq!(malignant.diagnosis, Diagnosis::Malignant);
    assert_eq!(malignant.advice, MALIGNANT_ADVICE);

    let benign = engine.recommend(&BENIGN).unwrap();
    assert_eq!(benign.diagnosis, Diagnosis::Benign);
    assert_eq!(benign.advice, BENIGN_ADVICE);
    assert!(benign.confidence > 0.9);
}

#[test]
fn test_unknown_cluster_surfaces_as_error() {
    let mut artifacts = trained_artifacts();
    let benign_cluster = DiagnosisEngine::new(artifacts.clone())
        .unwrap()
        .diagnose_one(&BENIGN)
        .unwrap()
        .cluster;

    // a map from a mismatched training run that only knows the benign cluster
    let mut entries = BTreeMap::new();
    entries.insert(benign_cluster, Diagnosis::Benign);
    artifacts.cluster_map = ClusterMap::new(entries);
    let engine = DiagnosisEngine::new(artifacts).unwrap();

    assert!(engine.diagnose_one(&BENIGN).is_ok());
    assert!(matches!(engine.diagnose_one(&MALIGNANT), Err(CytodxError::UnknownCluster(_))));
    assert!(matches!(
        engine.diagnose_batch(&[BENIGN.to_vec(), MALIGNANT.to_vec()]),
        Err(CytodxError::UnknownCluster(_))
    ));
}

#[test]
fn test_engine_loaded_from_store_and_shared_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("models"));
    store.save(&trained_artifacts()).unwrap();

    let engine = DiagnosisEngine::from_store(&store).unwrap();
    assert_eq!(engine.n_features(), 9);
    assert_eq!(engine.feature_importance().len(), 9);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine.clone();
                scope.spawn(move || {
                    let features = if i % 2 == 0 { BENIGN } else { MALIGNANT };
                    engine.diagnose_one(&features).unwrap().diagnosis
                })
            })
            .collect();
        let diagnoses: Vec<Diagnosis> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            diagnoses,
            vec![Diagnosis::Benign, Diagnosis::Malignant, Diagnosis::Benign, Diagnosis::Malignant]
        );
    });
}
