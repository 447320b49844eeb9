//! cytodx - Breast-tissue cytology diagnosis
//!
//! Offline, the crate cleans a labelled cytology dataset, searches a grid of
//! Gaussian mixture models and a grid of random forests, maps mixture
//! components to diagnoses and persists the fitted artifacts. Online, it
//! reloads those artifacts and diagnoses new samples.
//!
//! # Modules
//!
//! - [`data`] - Samples, datasets and CSV loading
//! - [`preprocessing`] - Imputation, outlier clipping, min-max scaling
//! - [`training`] - Mixture models, forests, cross-validation, metrics
//! - [`selection`] - Grid searches and cluster/diagnosis reconciliation
//! - [`export`] - Checksummed artifact store
//! - [`inference`] - Diagnosis engine and recommendations
//! - [`pipeline`] - The end-to-end training run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod config;
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod selection;
pub mod export;
pub mod inference;
pub mod pipeline;

pub mod cli;

pub use error::{CytodxError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::data::{Dataset, DatasetLoader, Diagnosis, Sample, FEATURE_NAMES};
    pub use crate::error::{CytodxError, Result};
    pub use crate::export::{ArtifactStore, ModelArtifacts};
    pub use crate::inference::{BatchSummary, DiagnosisEngine, DiagnosisResult, Recommendation};
    pub use crate::pipeline::{TrainingPipeline, TrainingReport};
    pub use crate::preprocessing::{FeaturePreparer, MinMaxScaler, PreprocessingConfig};
    pub use crate::selection::{
        ClusterMap, ClusterModelSelector, ClusterSearchConfig, FeatureImportanceRanking, ForestModelSelector,
        ForestSearchConfig,
    };
    pub use crate::training::{CovarianceType, GaussianMixture, RandomForest};
}
