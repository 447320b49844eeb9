//! Exhaustive search over mixture-model configurations
//!
//! Every configuration yields one [`ClusterCandidate`] record holding all
//! three scores. Label-agreement accuracy alone decides the winner; the
//! silhouette and Calinski–Harabasz scores are diagnostics for spotting
//! degenerate clusterings.

use super::config::{ClusterConfig, ClusterSearchConfig};
use super::label_map::{align_clusters_to_classes, map_predictions};
use super::SearchFailure;
use crate::error::{CytodxError, Result};
use crate::training::metrics::{accuracy, calinski_harabasz_score, n_populated, silhouette_score};
use crate::training::GaussianMixture;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scores of one evaluated configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCandidate {
    pub config: ClusterConfig,
    /// Agreement of aligned cluster predictions with ground truth
    pub accuracy: f64,
    /// 0 when fewer than two clusters are populated
    pub silhouette: f64,
    /// 0 when fewer than two clusters are populated
    pub calinski_harabasz: f64,
    pub n_populated: usize,
    pub converged: bool,
    pub lower_bound: f64,
}

/// Result of the mixture-model search
#[derive(Debug, Clone)]
pub struct ClusterSearchOutcome {
    /// Successful evaluations in grid order
    pub candidates: Vec<ClusterCandidate>,
    pub failures: Vec<SearchFailure<ClusterConfig>>,
    pub best: ClusterCandidate,
    /// Winning configuration refit on the full dataset
    pub model: GaussianMixture,
    /// Per-sample cluster ids from the refit model
    pub assignments: Vec<usize>,
}

impl ClusterSearchOutcome {
    /// Candidates ordered by accuracy, best first (stable for equal accuracy)
    pub fn ranked(&self) -> Vec<&ClusterCandidate> {
        let mut ranked: Vec<&ClusterCandidate> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| b.accuracy.partial_cmp(&a.accuracy).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Evaluates every mixture configuration sequentially and picks the most accurate
#[derive(Debug, Clone, Default)]
pub struct ClusterModelSelector {
    config: ClusterSearchConfig,
}

impl ClusterModelSelector {
    pub fn new(config: ClusterSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterSearchConfig {
        &self.config
    }

    /// Fit, align and score a single configuration
    pub fn evaluate(&self, config: ClusterConfig, x: &Array2<f64>, labels: &[i32]) -> Result<ClusterCandidate> {
        let mut model = config.build(&self.config);
        model.fit(x)?;
        let assignments = model.predict(x)?.to_vec();

        let cluster_to_class = align_clusters_to_classes(&assignments, labels, config.n_components);
        let mapped = map_predictions(&assignments, &cluster_to_class);
        let acc = accuracy(&mapped, labels);

        let populated = n_populated(&assignments);
        let (silhouette, calinski_harabasz) = if populated > 1 {
            (silhouette_score(x, &assignments)?, calinski_harabasz_score(x, &assignments)?)
        } else {
            (0.0, 0.0)
        };

        Ok(ClusterCandidate {
            config,
            accuracy: acc,
            silhouette,
            calinski_harabasz,
            n_populated: populated,
            converged: model.converged(),
            lower_bound: model.lower_bound().unwrap_or(f64::NEG_INFINITY),
        })
    }

    /// Run the full grid, select the winner and refit it on all data
    pub fn search(&self, x: &Array2<f64>, labels: &[i32]) -> Result<ClusterSearchOutcome> {
        self.config.validate()?;
        if x.nrows() != labels.len() {
            return Err(CytodxError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }

        let start = Instant::now();
        let mut candidates = Vec::new();
        let mut failures = Vec::new();

        for config in self.config.grid() {
            match self.evaluate(config, x, labels) {
                Ok(candidate) => {
                    info!(
                        n_components = config.n_components,
                        covariance = %config.covariance_type,
                        accuracy = candidate.accuracy,
                        silhouette = candidate.silhouette,
                        calinski_harabasz = candidate.calinski_harabasz,
                        "evaluated cluster configuration"
                    );
                    candidates.push(candidate);
                }
                Err(e) => {
                    warn!(
                        n_components = config.n_components,
                        covariance = %config.covariance_type,
                        error = %e,
                        "cluster configuration failed, skipping"
                    );
                    failures.push(SearchFailure { config, reason: e.to_string() });
                }
            }
        }

        let best = select_most_accurate(&candidates).cloned().ok_or_else(|| {
            CytodxError::TrainingError(format!(
                "all {} cluster configurations failed",
                failures.len()
            ))
        })?;

        let mut model = best.config.build(&self.config);
        model.fit(x)?;
        let assignments = model.predict(x)?.to_vec();

        let outcome = ClusterSearchOutcome {
            candidates,
            failures,
            best,
            model,
            assignments,
        };

        for candidate in outcome.ranked().into_iter().take(5) {
            debug!(config = %candidate.config, accuracy = candidate.accuracy, "top cluster configuration");
        }
        info!(
            config = %outcome.best.config,
            accuracy = outcome.best.accuracy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "selected cluster model"
        );

        Ok(outcome)
    }
}

/// First candidate with the strictly highest accuracy, in grid order
pub fn select_most_accurate(candidates: &[ClusterCandidate]) -> Option<&ClusterCandidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if c.accuracy <= b.accuracy => Some(b),
        _ => Some(c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::CovarianceType;

    fn candidate(n: usize, cov: CovarianceType, accuracy: f64, silhouette: f64) -> ClusterCandidate {
        ClusterCandidate {
            config: ClusterConfig::new(n, cov),
            accuracy,
            silhouette,
            calinski_harabasz: 0.0,
            n_populated: n,
            converged: true,
            lower_bound: 0.0,
        }
    }

    #[test]
    fn test_select_ignores_unsupervised_scores() {
        let candidates = vec![
            candidate(2, CovarianceType::Full, 0.90, 0.1),
            candidate(2, CovarianceType::Tied, 0.95, 0.0),
            candidate(3, CovarianceType::Full, 0.93, 0.9),
        ];
        let best = select_most_accurate(&candidates).unwrap();
        assert_eq!(best.config, ClusterConfig::new(2, CovarianceType::Tied));
    }

    #[test]
    fn test_select_tie_keeps_first_in_grid_order() {
        let candidates = vec![
            candidate(2, CovarianceType::Diagonal, 0.95, 0.2),
            candidate(3, CovarianceType::Full, 0.95, 0.8),
        ];
        let best = select_most_accurate(&candidates).unwrap();
        assert_eq!(best.config.n_components, 2);
    }

    #[test]
    fn test_select_empty() {
        assert!(select_most_accurate(&[]).is_none());
    }
}
