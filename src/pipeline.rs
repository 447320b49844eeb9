//! Offline training run
//!
//! Wires the feature preparer, both model searches and the label reconciler
//! together and hands the result to the artifact store.

use crate::config::PipelineConfig;
use crate::data::{Dataset, Diagnosis};
use crate::error::{CytodxError, Result};
use crate::export::{ArtifactStore, ModelArtifacts};
use crate::preprocessing::{FeaturePreparer, PreparationReport};
use crate::selection::{
    reconcile_labels, ClusterCandidate, ClusterModelSelector, FeatureImportanceRanking, ForestCandidate,
    ForestModelSelector,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Summary of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_samples: usize,
    pub n_features: usize,
    pub preparation: PreparationReport,
    /// Every evaluated mixture configuration in grid order
    pub cluster_candidates: Vec<ClusterCandidate>,
    pub cluster_failures: usize,
    pub best_cluster: ClusterCandidate,
    pub cluster_map: Vec<(usize, Diagnosis)>,
    pub forest_candidates: usize,
    pub forest_failures: usize,
    pub best_forest: ForestCandidate,
    pub elapsed_secs: f64,
}

/// Runs preparation, both searches and reconciliation
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train every model on `dataset` and return the artifacts with a report
    pub fn run(&self, dataset: &Dataset) -> Result<(ModelArtifacts, TrainingReport)> {
        self.config.validate()?;
        let start = Instant::now();

        let prepared = FeaturePreparer::new(self.config.preprocessing.clone()).prepare(dataset)?;
        info!(
            n_samples = prepared.n_samples(),
            n_features = prepared.n_features(),
            "prepared training data"
        );

        let cluster = ClusterModelSelector::new(self.config.cluster_search.clone())
            .search(&prepared.features, &prepared.labels)?;
        let cluster_map = reconcile_labels(&cluster.assignments, &prepared.labels)?;
        info!(n_clusters = cluster_map.len(), "reconciled cluster labels");

        let forest = ForestModelSelector::new(self.config.forest_search.clone())
            .search(&prepared.features, &prepared.labels)?;
        let importances = forest.model.feature_importances().ok_or(CytodxError::ModelNotFitted)?;
        let importance = FeatureImportanceRanking::from_importances(&prepared.feature_names, importances)?;

        let report = TrainingReport {
            n_samples: prepared.n_samples(),
            n_features: prepared.n_features(),
            preparation: prepared.report.clone(),
            cluster_failures: cluster.failures.len(),
            best_cluster: cluster.best.clone(),
            cluster_candidates: cluster.candidates,
            cluster_map: cluster_map.iter().collect(),
            forest_candidates: forest.candidates.len(),
            forest_failures: forest.failures.len(),
            best_forest: forest.best.clone(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };

        let artifacts = ModelArtifacts::new(prepared.scaler, cluster.model, cluster_map, forest.model, importance);
        artifacts.validate()?;

        info!(elapsed_secs = report.elapsed_secs, "training run finished");
        Ok((artifacts, report))
    }

    /// Train and persist the artifacts under `store`
    pub fn train_and_save(&self, dataset: &Dataset, store: &ArtifactStore) -> Result<(ModelArtifacts, TrainingReport)> {
        let (artifacts, report) = self.run(dataset)?;
        store.save(&artifacts)?;
        Ok((artifacts, report))
    }
}
