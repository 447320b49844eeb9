//! Min-max feature scaling

use crate::error::{CytodxError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Rescales each feature to `[0, 1]` using the min/max observed at fit time.
///
/// Constant features (range 0) use a scale of 1 and map to 0. The scaler is
/// never refit at inference, so values outside the training range map
/// outside `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Array1<f64>,
    data_range: Array1<f64>,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            data_min: Array1::zeros(0),
            data_range: Array1::zeros(0),
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    /// Record feature names alongside the fitted parameters
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(CytodxError::TrainingDataError(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let mins = x.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
        let maxs = x.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
        let ranges = (&maxs - &mins).mapv(|r| if r == 0.0 { 1.0 } else { r });

        if !self.feature_names.is_empty() && self.feature_names.len() != x.ncols() {
            return Err(CytodxError::ShapeError {
                expected: format!("{} columns", self.feature_names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        self.data_min = mins;
        self.data_range = ranges;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform a matrix whose width matches the fitted feature count
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        Ok((x - &self.data_min) / &self.data_range)
    }

    /// Transform a single feature vector
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok((&row - &self.data_min) / &self.data_range)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Number of features seen at fit time
    pub fn n_features_in(&self) -> usize {
        self.data_min.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn data_min(&self) -> &Array1<f64> {
        &self.data_min
    }

    pub fn data_range(&self) -> &Array1<f64> {
        &self.data_range
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check_width(&self, n: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(CytodxError::ModelNotFitted);
        }
        if n != self.n_features_in() {
            return Err(CytodxError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features_in(),
                n
            )));
        }
        Ok(())
    }
}
