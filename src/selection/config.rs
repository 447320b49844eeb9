//! Search grids and the immutable configuration values drawn from them

use crate::error::{CytodxError, Result};
use crate::training::{CovarianceType, GaussianMixture, RandomForest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the mixture-model grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub n_components: usize,
    pub covariance_type: CovarianceType,
}

impl ClusterConfig {
    pub fn new(n_components: usize, covariance_type: CovarianceType) -> Self {
        Self { n_components, covariance_type }
    }

    /// Unfitted mixture model for this configuration
    pub fn build(&self, search: &ClusterSearchConfig) -> GaussianMixture {
        GaussianMixture::new(self.n_components, self.covariance_type)
            .with_max_iter(search.max_iter)
            .with_n_init(search.n_init)
            .with_tol(search.tol)
            .with_reg_covar(search.reg_covar)
            .with_random_state(search.random_state)
    }
}

impl fmt::Display for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n_components={}, covariance={}", self.n_components, self.covariance_type)
    }
}

/// Grid and fitting settings for the mixture-model search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSearchConfig {
    pub n_components: Vec<usize>,
    pub covariance_types: Vec<CovarianceType>,
    pub max_iter: usize,
    /// Initialisations per fit; the best lower bound is kept
    pub n_init: usize,
    pub tol: f64,
    pub reg_covar: f64,
    pub random_state: u64,
}

impl Default for ClusterSearchConfig {
    fn default() -> Self {
        Self {
            n_components: vec![2, 3, 4],
            covariance_types: CovarianceType::ALL.to_vec(),
            max_iter: 200,
            n_init: 10,
            tol: 1e-3,
            reg_covar: 1e-6,
            random_state: 42,
        }
    }
}

impl ClusterSearchConfig {
    pub fn with_n_components(mut self, n_components: Vec<usize>) -> Self {
        self.n_components = n_components;
        self
    }

    pub fn with_covariance_types(mut self, types: Vec<CovarianceType>) -> Self {
        self.covariance_types = types;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Configurations in search order: component count outer, covariance shape inner
    pub fn grid(&self) -> Vec<ClusterConfig> {
        self.n_components
            .iter()
            .flat_map(|&n| {
                self.covariance_types
                    .iter()
                    .map(move |&cov| ClusterConfig::new(n, cov))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid().is_empty() {
            return Err(CytodxError::ConfigError("cluster search grid is empty".to_string()));
        }
        if self.n_components.contains(&0) {
            return Err(CytodxError::ConfigError("n_components must be positive".to_string()));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(CytodxError::ConfigError("n_init and max_iter must be positive".to_string()));
        }
        Ok(())
    }
}

/// One point of the forest grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl ForestConfig {
    /// Unfitted forest for this configuration
    pub fn build(&self, random_state: u64) -> RandomForest {
        RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_random_state(random_state)
    }
}

impl fmt::Display for ForestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.max_depth.map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}, min_samples_leaf={}",
            self.n_estimators, depth, self.min_samples_split, self.min_samples_leaf
        )
    }
}

/// Grid and validation settings for the forest search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSearchConfig {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub cv_folds: usize,
    pub random_state: u64,
    /// Evaluate configurations on the rayon pool
    pub parallel: bool,
}

impl Default for ForestSearchConfig {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
            cv_folds: 5,
            random_state: 42,
            parallel: true,
        }
    }
}

impl ForestSearchConfig {
    pub fn with_n_estimators(mut self, values: Vec<usize>) -> Self {
        self.n_estimators = values;
        self
    }

    pub fn with_max_depth(mut self, values: Vec<Option<usize>>) -> Self {
        self.max_depth = values;
        self
    }

    pub fn with_min_samples_split(mut self, values: Vec<usize>) -> Self {
        self.min_samples_split = values;
        self
    }

    pub fn with_min_samples_leaf(mut self, values: Vec<usize>) -> Self {
        self.min_samples_leaf = values;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Configurations in search order (n_estimators outermost, min_samples_leaf innermost)
    pub fn grid(&self) -> Vec<ForestConfig> {
        let mut grid = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        grid.push(ForestConfig {
                            n_estimators,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        grid
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid().is_empty() {
            return Err(CytodxError::ConfigError("forest search grid is empty".to_string()));
        }
        if self.cv_folds < 2 {
            return Err(CytodxError::ConfigError("cv_folds must be at least 2".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_sizes() {
        assert_eq!(ClusterSearchConfig::default().grid().len(), 12);
        assert_eq!(ForestSearchConfig::default().grid().len(), 81);
    }

    #[test]
    fn test_cluster_grid_order() {
        let grid = ClusterSearchConfig::default().grid();
        assert_eq!(grid[0], ClusterConfig::new(2, CovarianceType::Full));
        assert_eq!(grid[1], ClusterConfig::new(2, CovarianceType::Tied));
        assert_eq!(grid[4], ClusterConfig::new(3, CovarianceType::Full));
        assert_eq!(grid[11], ClusterConfig::new(4, CovarianceType::Spherical));
    }

    #[test]
    fn test_forest_grid_order() {
        let grid = ForestSearchConfig::default().grid();
        assert_eq!(grid[0].n_estimators, 50);
        assert_eq!(grid[0].max_depth, None);
        assert_eq!(grid[1].min_samples_leaf, 2);
        assert_eq!(grid[80].n_estimators, 200);
        assert_eq!(grid[80].max_depth, Some(20));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = ForestSearchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ForestSearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid(), config.grid());
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let config = ClusterSearchConfig::default().with_n_components(Vec::new());
        assert!(config.validate().is_err());
    }
}
