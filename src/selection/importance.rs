//! Feature-importance ranking derived from the selected forest

use crate::error::{CytodxError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Features ordered by descending importance; scores sum to 1
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureImportanceRanking {
    entries: Vec<FeatureImportance>,
}

impl FeatureImportanceRanking {
    /// Pair importances with feature names and sort them.
    ///
    /// Scores are renormalized to sum to 1. When every score is zero (a forest
    /// of single-leaf trees) each feature gets an equal share instead.
    pub fn from_importances(feature_names: &[String], importances: &Array1<f64>) -> Result<Self> {
        if feature_names.len() != importances.len() {
            return Err(CytodxError::ShapeError {
                expected: format!("{} importances", feature_names.len()),
                actual: format!("{} importances", importances.len()),
            });
        }
        if feature_names.is_empty() {
            return Err(CytodxError::InvalidInput("no features to rank".to_string()));
        }
        if importances.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CytodxError::InvalidInput(
                "importances must be finite and non-negative".to_string(),
            ));
        }

        let total: f64 = importances.sum();
        let uniform = 1.0 / feature_names.len() as f64;
        let mut entries: Vec<FeatureImportance> = feature_names
            .iter()
            .zip(importances.iter())
            .map(|(name, &value)| FeatureImportance {
                feature: name.clone(),
                importance: if total > 0.0 { value / total } else { uniform },
            })
            .collect();

        // stable: equal scores keep feature order
        entries.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FeatureImportance] {
        &self.entries
    }

    /// The `n` most important features
    pub fn top(&self, n: usize) -> &[FeatureImportance] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.importance).sum()
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.feature.eq_ignore_ascii_case(feature))
            .map(|e| e.importance)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_ranking_sorted_and_normalized() {
        let ranking = FeatureImportanceRanking::from_importances(&names(), &array![1.0, 3.0, 0.0]).unwrap();
        let order: Vec<&str> = ranking.entries().iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert!((ranking.total() - 1.0).abs() < 1e-12);
        assert!((ranking.get("B").unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_falls_back_to_uniform() {
        let ranking = FeatureImportanceRanking::from_importances(&names(), &array![0.0, 0.0, 0.0]).unwrap();
        assert!(ranking.entries().iter().all(|e| (e.importance - 1.0 / 3.0).abs() < 1e-12));
        assert_eq!(ranking.entries()[0].feature, "a");
    }

    #[test]
    fn test_length_mismatch() {
        assert!(FeatureImportanceRanking::from_importances(&names(), &array![1.0]).is_err());
    }

    #[test]
    fn test_top_clamps() {
        let ranking = FeatureImportanceRanking::from_importances(&names(), &array![1.0, 1.0, 1.0]).unwrap();
        assert_eq!(ranking.top(10).len(), 3);
        assert_eq!(ranking.top(1).len(), 1);
    }
}
