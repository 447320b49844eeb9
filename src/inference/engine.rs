//! Inference engine implementation
//!
//! Serves diagnoses from an immutable, `Arc`-shared artifact set:
//! - Cluster-model diagnosis for one sample or a batch (rayon)
//! - Forest-based recommendation with advice text
//! - Whole-batch validation before any model call

use super::recommendation::Recommendation;
use crate::data::Diagnosis;
use crate::error::{CytodxError, Result};
use crate::export::{ArtifactStore, ModelArtifacts};
use crate::selection::FeatureImportanceRanking;
use ndarray::{ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cluster-model diagnosis of one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnosis: Diagnosis,
    /// Highest posterior probability of the mixture
    pub confidence: f64,
    /// Mixture component the sample was assigned to
    pub cluster: usize,
}

/// Counts over a diagnosed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_patients: usize,
    pub benign: usize,
    pub malignant: usize,
    pub mean_confidence: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[DiagnosisResult]) -> Self {
        let malignant = results
            .iter()
            .filter(|r| r.diagnosis == Diagnosis::Malignant)
            .count();
        let mean_confidence = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64
        };
        Self {
            total_patients: results.len(),
            benign: results.len() - malignant,
            malignant,
            mean_confidence,
        }
    }
}

/// Read-only diagnosis service over a loaded artifact set
#[derive(Debug, Clone)]
pub struct DiagnosisEngine {
    artifacts: Arc<ModelArtifacts>,
}

impl DiagnosisEngine {
    pub fn new(artifacts: ModelArtifacts) -> Result<Self> {
        artifacts.validate()?;
        Ok(Self {
            artifacts: Arc::new(artifacts),
        })
    }

    pub fn from_store(store: &ArtifactStore) -> Result<Self> {
        Self::new(store.load()?)
    }

    /// Load the artifact directory written by a training run
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_store(&ArtifactStore::new(dir.as_ref()))
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Feature count every input vector must have
    pub fn n_features(&self) -> usize {
        self.artifacts.n_features()
    }

    pub fn feature_names(&self) -> &[String] {
        self.artifacts.scaler.feature_names()
    }

    pub fn feature_importance(&self) -> &FeatureImportanceRanking {
        &self.artifacts.importance
    }

    fn check_features(&self, features: &[f64]) -> std::result::Result<(), String> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(format!("expected {} features, got {}", expected, features.len()));
        }
        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(format!("feature {} is not a finite number", idx));
        }
        Ok(())
    }

    fn validate(&self, features: &[f64]) -> Result<()> {
        self.check_features(features).map_err(|reason| {
            warn!(reason = %reason, "rejected inference input");
            CytodxError::InvalidInput(reason)
        })
    }

    fn diagnose_validated(&self, features: &[f64]) -> Result<DiagnosisResult> {
        let scaled = self.artifacts.scaler.transform_row(ArrayView1::from(features))?;
        let x = scaled.insert_axis(Axis(0));
        let proba = self.artifacts.cluster_model.predict_proba(&x)?;
        let posterior = proba.row(0);

        // inputs far outside the training range underflow every component density
        let total: f64 = posterior.sum();
        if !posterior.iter().all(|p| p.is_finite()) || (total - 1.0).abs() > 1e-6 {
            warn!(total, "posterior overflowed for inference input");
            return Err(CytodxError::InvalidInput(
                "feature values overflow the cluster model posterior".to_string(),
            ));
        }

        let (cluster, confidence) = posterior
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (c, p)| if p > best.1 { (c, p) } else { best });

        let diagnosis = self.artifacts.cluster_map.diagnosis(cluster)?;
        Ok(DiagnosisResult {
            diagnosis,
            confidence,
            cluster,
        })
    }

    /// Diagnose one sample with the cluster model
    pub fn diagnose_one(&self, features: &[f64]) -> Result<DiagnosisResult> {
        self.validate(features)?;
        let result = self.diagnose_validated(features)?;
        debug!(diagnosis = %result.diagnosis, confidence = result.confidence, cluster = result.cluster, "diagnosed sample");
        Ok(result)
    }

    /// Diagnose many samples; any invalid row rejects the whole batch
    pub fn diagnose_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<DiagnosisResult>> {
        if rows.is_empty() {
            warn!("rejected empty batch");
            return Err(CytodxError::InvalidInput("batch contains no samples".to_string()));
        }
        for (idx, row) in rows.iter().enumerate() {
            self.check_features(row).map_err(|reason| {
                warn!(row = idx, reason = %reason, "rejected batch");
                CytodxError::InvalidInput(format!("row {}: {}", idx, reason))
            })?;
        }

        let results = rows
            .par_iter()
            .map(|row| self.diagnose_validated(row))
            .collect::<Result<Vec<_>>>()?;
        debug!(n_samples = results.len(), "diagnosed batch");
        Ok(results)
    }

    /// Forest prediction with the matching advice template
    pub fn recommend(&self, features: &[f64]) -> Result<Recommendation> {
        self.validate(features)?;
        let scaled = self.artifacts.scaler.transform_row(ArrayView1::from(features))?;
        let (class, confidence) = self.artifacts.forest.predict_one(scaled.view())?;
        let diagnosis = Diagnosis::from_class(class)?;
        debug!(diagnosis = %diagnosis, confidence, "built recommendation");
        Ok(Recommendation::new(diagnosis, confidence))
    }
}
