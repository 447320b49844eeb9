//! IQR-based outlier clipping

use crate::error::{CytodxError, Result};
use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

/// Fitted clip bounds for one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Clips values to `[Q1 - factor * IQR, Q3 + factor * IQR]`.
///
/// Values are clipped, never removed, so the row count is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IqrClipper {
    pub factor: f64,
    bounds: Option<OutlierBounds>,
}

impl Default for IqrClipper {
    fn default() -> Self {
        Self::new(1.5)
    }
}

impl IqrClipper {
    pub fn new(factor: f64) -> Self {
        Self { factor, bounds: None }
    }

    pub fn fit(&mut self, values: ArrayView1<f64>) -> Result<&mut Self> {
        if values.is_empty() {
            return Err(CytodxError::TrainingDataError(
                "cannot compute quartiles of an empty column".to_string(),
            ));
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        self.bounds = Some(OutlierBounds {
            q1,
            q3,
            lower: q1 - self.factor * iqr,
            upper: q3 + self.factor * iqr,
        });
        Ok(self)
    }

    /// Clip in place, returning how many values changed
    pub fn transform(&self, mut values: ArrayViewMut1<f64>) -> Result<usize> {
        let bounds = self.bounds.ok_or(CytodxError::ModelNotFitted)?;
        let mut clipped = 0;
        for v in values.iter_mut() {
            let c = v.clamp(bounds.lower, bounds.upper);
            if c != *v {
                *v = c;
                clipped += 1;
            }
        }
        Ok(clipped)
    }

    pub fn bounds(&self) -> Option<&OutlierBounds> {
        self.bounds.as_ref()
    }
}

/// Percentile of pre-sorted data using linear interpolation between order statistics
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        // position 0.75 between 1 and 2
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 75.0) - 3.25).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 50.0), 7.0);
    }

    #[test]
    fn test_clip_keeps_row_count() {
        let mut values = array![1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 10.0, 1.0];
        let mut clipper = IqrClipper::new(1.5);
        clipper.fit(values.view()).unwrap();

        let bounds = *clipper.bounds().unwrap();
        // Q1 = 1, Q3 = 1.25, IQR = 0.25
        assert!((bounds.upper - 1.625).abs() < 1e-12);

        let clipped = clipper.transform(values.view_mut()).unwrap();
        assert_eq!(clipped, 2);
        assert_eq!(values.len(), 8);
        assert!(values.iter().all(|&v| v <= bounds.upper && v >= bounds.lower));
    }

    #[test]
    fn test_transform_before_fit() {
        let mut values = array![1.0, 2.0];
        let clipper = IqrClipper::default();
        assert!(clipper.transform(values.view_mut()).is_err());
    }
}
