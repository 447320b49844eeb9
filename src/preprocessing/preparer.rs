//! Feature preparation: impute, clip, normalize

use super::config::PreprocessingConfig;
use super::imputer::{ImputedFeature, MeanImputer};
use super::outlier::{IqrClipper, OutlierBounds};
use super::scaler::MinMaxScaler;
use crate::data::Dataset;
use crate::error::{CytodxError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of the clipping step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSummary {
    pub feature: String,
    pub bounds: OutlierBounds,
    pub n_clipped: usize,
}

/// What the preparer changed in the raw data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreparationReport {
    pub imputed: Vec<ImputedFeature>,
    /// `None` when the clip feature is absent or disabled
    pub clipped: Option<ClipSummary>,
}

/// Normalized training data plus the fitted transform
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Normalized feature matrix (rows × features), every value in `[0, 1]`
    pub features: Array2<f64>,
    /// Class codes in row order
    pub labels: Vec<i32>,
    pub scaler: MinMaxScaler,
    pub feature_names: Vec<String>,
    pub report: PreparationReport,
}

impl PreparedData {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Cleans a raw dataset and produces a normalized matrix
#[derive(Debug, Clone, Default)]
pub struct FeaturePreparer {
    config: PreprocessingConfig,
}

impl FeaturePreparer {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Run imputation, clipping and normalization over the dataset
    pub fn prepare(&self, dataset: &Dataset) -> Result<PreparedData> {
        if dataset.is_empty() {
            return Err(CytodxError::TrainingDataError("dataset is empty".to_string()));
        }

        let mut imputer = MeanImputer::new();
        let (mut x, imputed) = imputer.fit_transform(dataset)?;

        let clipped = match &self.config.clip_feature {
            Some(name) => match dataset.feature_index(name) {
                Some(idx) => Some(self.clip_column(&mut x, idx, &dataset.feature_names()[idx])?),
                None => {
                    debug!(feature = %name, "clip feature absent, skipping outlier step");
                    None
                }
            },
            None => None,
        };

        let mut scaler = MinMaxScaler::new().with_feature_names(dataset.feature_names().to_vec());
        let features = scaler.fit_transform(&x)?;

        info!(
            rows = features.nrows(),
            features = features.ncols(),
            imputed_features = imputed.len(),
            "prepared feature matrix"
        );

        Ok(PreparedData {
            features,
            labels: dataset.labels(),
            scaler,
            feature_names: dataset.feature_names().to_vec(),
            report: PreparationReport { imputed, clipped },
        })
    }

    fn clip_column(&self, x: &mut Array2<f64>, idx: usize, name: &str) -> Result<ClipSummary> {
        let mut clipper = IqrClipper::new(self.config.iqr_factor);
        clipper.fit(x.column(idx))?;
        let n_clipped = clipper.transform(x.column_mut(idx))?;
        let bounds = *clipper.bounds().ok_or(CytodxError::ModelNotFitted)?;

        info!(
            feature = name,
            lower = bounds.lower,
            upper = bounds.upper,
            clipped = n_clipped,
            "clipped outliers"
        );

        Ok(ClipSummary {
            feature: name.to_string(),
            bounds,
            n_clipped,
        })
    }
}
