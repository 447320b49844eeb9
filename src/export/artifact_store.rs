//! Directory store for the five trained artifacts
//!
//! `save` is all-or-nothing from the caller's point of view: artifacts are
//! written to a staging directory next to the target and swapped in only
//! after every write succeeded. `load` refuses to return anything unless all
//! five files are present.

use super::serializer::{read_binary, read_json, write_binary, write_json, ArtifactMetadata};
use crate::error::{CytodxError, Result};
use crate::preprocessing::MinMaxScaler;
use crate::selection::{ClusterMap, FeatureImportanceRanking};
use crate::training::{GaussianMixture, RandomForest};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCALER_FILE: &str = "scaler.json";
pub const CLUSTER_MODEL_FILE: &str = "cluster_model.bin";
pub const CLUSTER_MAP_FILE: &str = "cluster_to_diagnosis.json";
pub const FOREST_MODEL_FILE: &str = "forest_model.bin";
pub const IMPORTANCE_FILE: &str = "feature_importance.json";

/// Every file a complete artifact set consists of, in load-check order
pub const ARTIFACT_FILES: [&str; 5] = [
    SCALER_FILE,
    CLUSTER_MODEL_FILE,
    CLUSTER_MAP_FILE,
    FOREST_MODEL_FILE,
    IMPORTANCE_FILE,
];

/// The fitted state shared between training and inference
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler: MinMaxScaler,
    pub cluster_model: GaussianMixture,
    pub cluster_map: ClusterMap,
    pub forest: RandomForest,
    pub importance: FeatureImportanceRanking,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifacts {
    pub fn new(
        scaler: MinMaxScaler,
        cluster_model: GaussianMixture,
        cluster_map: ClusterMap,
        forest: RandomForest,
        importance: FeatureImportanceRanking,
    ) -> Self {
        Self {
            scaler,
            cluster_model,
            cluster_map,
            forest,
            importance,
            trained_at: Utc::now(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features_in()
    }

    /// Components of the cluster model the map does not cover
    pub fn unmapped_clusters(&self) -> Vec<usize> {
        (0..self.cluster_model.n_components)
            .filter(|c| !self.cluster_map.contains(*c))
            .collect()
    }

    /// Check that the models agree on the feature space
    pub fn validate(&self) -> Result<()> {
        if !self.scaler.is_fitted() || !self.cluster_model.is_fitted {
            return Err(CytodxError::ModelNotFitted);
        }
        let expected = self.scaler.n_features_in();
        for (name, actual) in [
            ("cluster model", self.cluster_model.n_features()),
            ("forest", self.forest.n_features()),
            ("importance ranking", self.importance.len()),
        ] {
            if actual != expected {
                return Err(CytodxError::ShapeError {
                    expected: format!("{} features (scaler)", expected),
                    actual: format!("{} features ({})", actual, name),
                });
            }
        }
        Ok(())
    }

    fn cluster_metadata(&self) -> ArtifactMetadata {
        let model = &self.cluster_model;
        ArtifactMetadata::new("cluster_model", "gaussian_mixture")
            .with_trained_at(self.trained_at)
            .add_hyperparameter("n_components", model.n_components)
            .add_hyperparameter("covariance_type", model.covariance_type)
            .add_hyperparameter("n_init", model.n_init)
            .add_metric("lower_bound", model.lower_bound().unwrap_or(f64::NAN))
    }

    fn forest_metadata(&self) -> ArtifactMetadata {
        let forest = &self.forest;
        ArtifactMetadata::new("forest_model", "random_forest")
            .with_trained_at(self.trained_at)
            .add_hyperparameter("n_estimators", forest.n_estimators)
            .add_hyperparameter(
                "max_depth",
                forest.max_depth.map_or_else(|| "None".to_string(), |d| d.to_string()),
            )
            .add_hyperparameter("min_samples_split", forest.min_samples_split)
            .add_hyperparameter("min_samples_leaf", forest.min_samples_leaf)
    }
}

/// Persists and restores [`ModelArtifacts`] under one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, artifact: &str) -> PathBuf {
        self.dir.join(artifact)
    }

    /// First artifact file absent from the directory, if any
    pub fn first_missing(&self) -> Option<&'static str> {
        ARTIFACT_FILES
            .iter()
            .copied()
            .find(|name| !self.path_of(name).is_file())
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifacts".to_string());
        let parent = self.dir.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{}.{}", name, suffix))
    }

    /// Write all five artifacts, replacing any previous set only on success
    pub fn save(&self, artifacts: &ModelArtifacts) -> Result<()> {
        artifacts.validate()?;

        if let Some(parent) = self.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.sibling("staging");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        if let Err(e) = write_all(&staging, artifacts) {
            warn!(dir = %self.dir.display(), error = %e, "artifact save failed, previous set left in place");
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let backup = self.sibling("previous");
        if self.dir.exists() {
            if backup.exists() {
                fs::remove_dir_all(&backup)?;
            }
            fs::rename(&self.dir, &backup)?;
        }
        if let Err(e) = fs::rename(&staging, &self.dir) {
            if backup.exists() {
                fs::rename(&backup, &self.dir)?;
            }
            return Err(e.into());
        }
        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }

        info!(dir = %self.dir.display(), n_artifacts = ARTIFACT_FILES.len(), "saved model artifacts");
        Ok(())
    }

    /// Load the complete set; fails with `MissingArtifact` before reading anything if a file is absent
    pub fn load(&self) -> Result<ModelArtifacts> {
        if let Some(missing) = self.first_missing() {
            warn!(dir = %self.dir.display(), artifact = missing, "artifact set incomplete");
            return Err(CytodxError::MissingArtifact(missing.to_string()));
        }

        let scaler: MinMaxScaler = read_json(self.path_of(SCALER_FILE))?;
        let (cluster_model, cluster_meta): (GaussianMixture, _) = read_binary(self.path_of(CLUSTER_MODEL_FILE))?;
        let cluster_map: ClusterMap = read_json(self.path_of(CLUSTER_MAP_FILE))?;
        let (forest, _): (RandomForest, _) = read_binary(self.path_of(FOREST_MODEL_FILE))?;
        let importance: FeatureImportanceRanking = read_json(self.path_of(IMPORTANCE_FILE))?;

        let artifacts = ModelArtifacts {
            scaler,
            cluster_model,
            cluster_map,
            forest,
            importance,
            trained_at: cluster_meta.trained_at,
        };
        artifacts.validate()?;

        let unmapped = artifacts.unmapped_clusters();
        if !unmapped.is_empty() {
            warn!(clusters = ?unmapped, "cluster map does not cover every component; diagnoses landing there will fail");
        }

        info!(
            dir = %self.dir.display(),
            trained_at = %artifacts.trained_at,
            n_components = artifacts.cluster_model.n_components,
            n_trees = artifacts.forest.n_trees(),
            "loaded model artifacts"
        );
        Ok(artifacts)
    }
}

fn write_all(dir: &Path, artifacts: &ModelArtifacts) -> Result<()> {
    write_json(&artifacts.scaler, dir.join(SCALER_FILE))?;
    write_binary(&artifacts.cluster_model, dir.join(CLUSTER_MODEL_FILE), artifacts.cluster_metadata())?;
    write_json(&artifacts.cluster_map, dir.join(CLUSTER_MAP_FILE))?;
    write_binary(&artifacts.forest, dir.join(FOREST_MODEL_FILE), artifacts.forest_metadata())?;
    write_json(&artifacts.importance, dir.join(IMPORTANCE_FILE))?;
    debug!(staging = %dir.display(), "wrote artifacts to staging directory");
    Ok(())
}
