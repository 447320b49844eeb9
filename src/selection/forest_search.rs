//! Cross-validated grid search over random-forest configurations

use super::config::{ForestConfig, ForestSearchConfig};
use super::SearchFailure;
use crate::error::{CytodxError, Result};
use crate::training::metrics::accuracy;
use crate::training::{CVResults, CVSplit, CVStrategy, CrossValidator, RandomForest};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cross-validation result of one configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestCandidate {
    pub config: ForestConfig,
    pub cv: CVResults,
}

impl ForestCandidate {
    pub fn mean_accuracy(&self) -> f64 {
        self.cv.mean_score
    }
}

/// Result of the forest search
#[derive(Debug, Clone)]
pub struct ForestSearchOutcome {
    /// Successful evaluations in grid order
    pub candidates: Vec<ForestCandidate>,
    pub failures: Vec<SearchFailure<ForestConfig>>,
    pub best: ForestCandidate,
    /// Winning configuration refit on the full dataset
    pub model: RandomForest,
}

/// Picks the forest configuration with the best mean fold accuracy
#[derive(Debug, Clone, Default)]
pub struct ForestModelSelector {
    config: ForestSearchConfig,
}

impl ForestModelSelector {
    pub fn new(config: ForestSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestSearchConfig {
        &self.config
    }

    /// Stratified, unshuffled folds shared by every configuration
    pub fn folds(&self, labels: &[i32]) -> Result<Vec<CVSplit>> {
        CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: self.config.cv_folds,
            shuffle: false,
        })
        .with_random_state(self.config.random_state)
        .split(labels.len(), Some(labels))
    }

    /// Mean held-out accuracy of one configuration over the given folds
    pub fn evaluate(
        &self,
        config: ForestConfig,
        x: &Array2<f64>,
        labels: &[i32],
        folds: &[CVSplit],
    ) -> Result<ForestCandidate> {
        let mut scores = Vec::with_capacity(folds.len());
        for split in folds {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train: Vec<i32> = split.train_indices.iter().map(|&i| labels[i]).collect();
            let x_test = x.select(Axis(0), &split.test_indices);
            let y_test: Vec<i32> = split.test_indices.iter().map(|&i| labels[i]).collect();

            let mut forest = config.build(self.config.random_state);
            forest.fit(&x_train, &y_train)?;
            let predicted = forest.predict(&x_test)?.to_vec();
            scores.push(accuracy(&predicted, &y_test));
        }
        Ok(ForestCandidate {
            config,
            cv: CVResults::from_scores(scores),
        })
    }

    /// Evaluate the grid, select the winner and refit it on all data
    pub fn search(&self, x: &Array2<f64>, labels: &[i32]) -> Result<ForestSearchOutcome> {
        self.config.validate()?;
        if x.nrows() != labels.len() {
            return Err(CytodxError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }

        let start = Instant::now();
        let folds = self.folds(labels)?;
        let grid = self.config.grid();
        info!(
            n_configs = grid.len(),
            n_folds = folds.len(),
            parallel = self.config.parallel,
            "starting forest search"
        );

        let run = |config: ForestConfig| (config, self.evaluate(config, x, labels, &folds));
        let results: Vec<(ForestConfig, Result<ForestCandidate>)> = if self.config.parallel {
            grid.into_par_iter().map(run).collect()
        } else {
            grid.into_iter().map(run).collect()
        };

        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        for (config, result) in results {
            match result {
                Ok(candidate) => {
                    debug!(config = %config, mean_accuracy = candidate.mean_accuracy(), "evaluated forest configuration");
                    candidates.push(candidate);
                }
                Err(e) => {
                    warn!(config = %config, error = %e, "forest configuration failed, skipping");
                    failures.push(SearchFailure { config, reason: e.to_string() });
                }
            }
        }

        let best = select_best_forest(&candidates).cloned().ok_or_else(|| {
            CytodxError::TrainingError(format!("all {} forest configurations failed", failures.len()))
        })?;

        let mut model = best.config.build(self.config.random_state);
        model.fit(x, labels)?;

        info!(
            config = %best.config,
            mean_accuracy = best.mean_accuracy(),
            std = best.cv.std_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "selected forest model"
        );

        Ok(ForestSearchOutcome {
            candidates,
            failures,
            best,
            model,
        })
    }
}

/// Earliest candidate with the strictly highest mean accuracy
pub fn select_best_forest(candidates: &[ForestCandidate]) -> Option<&ForestCandidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if c.mean_accuracy() <= b.mean_accuracy() => Some(b),
        _ => Some(c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Vec<i32>) {
        let n = 20;
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let malignant = i % 2 == 1;
            let base = if malignant { 0.9 } else { 0.1 };
            x[[i, 0]] = base + (i as f64) * 0.001;
            x[[i, 1]] = base;
            y.push(if malignant { 4 } else { 2 });
        }
        (x, y)
    }

    fn small_grid() -> ForestSearchConfig {
        ForestSearchConfig::default()
            .with_n_estimators(vec![5, 10])
            .with_max_depth(vec![None, Some(3)])
            .with_min_samples_split(vec![2])
            .with_min_samples_leaf(vec![1])
    }

    #[test]
    fn test_search_picks_first_perfect_config() {
        let (x, y) = separable();
        let outcome = ForestModelSelector::new(small_grid()).search(&x, &y).unwrap();

        assert_eq!(outcome.candidates.len(), 4);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.best.mean_accuracy(), 1.0);
        assert_eq!(outcome.best.config, small_grid().grid()[0]);
        assert_eq!(outcome.model.n_trees(), 5);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = separable();
        let par = ForestModelSelector::new(small_grid()).search(&x, &y).unwrap();
        let seq = ForestModelSelector::new(small_grid().with_parallel(false))
            .search(&x, &y)
            .unwrap();

        let par_scores: Vec<f64> = par.candidates.iter().map(|c| c.mean_accuracy()).collect();
        let seq_scores: Vec<f64> = seq.candidates.iter().map(|c| c.mean_accuracy()).collect();
        assert_eq!(par_scores, seq_scores);
        assert_eq!(par.best.config, seq.best.config);
    }

    #[test]
    fn test_too_few_samples_for_folds() {
        let x = Array2::zeros((3, 2));
        let result = ForestModelSelector::new(small_grid()).search(&x, &[2, 4, 2]);
        assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
    }

    #[test]
    fn test_failing_configuration_is_skipped() {
        let (x, y) = separable();
        let grid = small_grid().with_n_estimators(vec![0, 5]).with_max_depth(vec![None]);
        let outcome = ForestModelSelector::new(grid).search(&x, &y).unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].config.n_estimators, 0);
        assert_eq!(outcome.best.config.n_estimators, 5);
        assert_eq!(outcome.model.n_trees(), 5);
    }

    #[test]
    fn test_search_fails_when_every_configuration_fails() {
        let (x, y) = separable();
        let grid = small_grid().with_n_estimators(vec![0]).with_max_depth(vec![None]);
        match ForestModelSelector::new(grid).search(&x, &y) {
            Err(CytodxError::TrainingError(msg)) => assert!(msg.contains("all 1"), "message = {}", msg),
            other => panic!("expected TrainingError, got {:?}", other.map(|o| o.best.config)),
        }
    }
}
