//! Mean imputation of unknown measurements

use crate::data::Dataset;
use crate::error::{CytodxError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fill value chosen for one feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImputedFeature {
    pub feature: String,
    /// Mean over the observed values
    pub fill_value: f64,
    /// Number of unknown values replaced
    pub n_imputed: usize,
}

/// Replaces unknown values with the mean of the feature's observed values.
///
/// Only features that actually contain unknown values receive a fill value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanImputer {
    fill_values: Vec<Option<f64>>,
    is_fitted: bool,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute fill values from the dataset
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self> {
        let n_features = dataset.n_features();
        let mut sums = vec![0.0; n_features];
        let mut observed = vec![0usize; n_features];
        let mut missing = vec![0usize; n_features];

        for sample in dataset.samples() {
            for (j, value) in sample.features.iter().enumerate() {
                match value {
                    Some(v) => {
                        sums[j] += v;
                        observed[j] += 1;
                    }
                    None => missing[j] += 1,
                }
            }
        }

        let mut fill_values = vec![None; n_features];
        for j in 0..n_features {
            if missing[j] == 0 {
                continue;
            }
            if observed[j] == 0 {
                return Err(CytodxError::TrainingDataError(format!(
                    "feature '{}' has no observed values to impute from",
                    dataset.feature_names()[j]
                )));
            }
            fill_values[j] = Some(sums[j] / observed[j] as f64);
        }

        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Produce a dense matrix with every unknown value filled
    pub fn transform(&self, dataset: &Dataset) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CytodxError::ModelNotFitted);
        }
        if dataset.n_features() != self.fill_values.len() {
            return Err(CytodxError::ShapeError {
                expected: format!("{} features", self.fill_values.len()),
                actual: format!("{} features", dataset.n_features()),
            });
        }

        let mut matrix = Array2::zeros((dataset.n_samples(), dataset.n_features()));
        for (i, sample) in dataset.samples().iter().enumerate() {
            for (j, value) in sample.features.iter().enumerate() {
                matrix[[i, j]] = match (value, self.fill_values[j]) {
                    (Some(v), _) => *v,
                    (None, Some(fill)) => fill,
                    (None, None) => {
                        return Err(CytodxError::TrainingDataError(format!(
                            "unknown value in feature '{}' was not seen during fit",
                            dataset.feature_names()[j]
                        )))
                    }
                };
            }
        }
        Ok(matrix)
    }

    /// Fit and transform in one step, reporting what was filled
    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<(Array2<f64>, Vec<ImputedFeature>)> {
        self.fit(dataset)?;
        let matrix = self.transform(dataset)?;

        let counts = dataset.missing_counts();
        let report: Vec<ImputedFeature> = self
            .fill_values
            .iter()
            .enumerate()
            .filter_map(|(j, fill)| {
                fill.map(|fill_value| ImputedFeature {
                    feature: dataset.feature_names()[j].clone(),
                    fill_value,
                    n_imputed: counts[j],
                })
            })
            .collect();

        for item in &report {
            info!(feature = %item.feature, fill_value = item.fill_value, count = item.n_imputed, "imputed unknown values");
        }

        Ok((matrix, report))
    }
}
