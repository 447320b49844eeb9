//! Model training module
//!
//! Provides the models the diagnosis pipeline searches over:
//! - Gaussian mixture models (full, tied, diagonal, spherical covariances)
//! - K-Means (mixture initialisation)
//! - Decision trees and Random Forests
//! - Cross-validation splitters and quality metrics

pub mod clustering;
pub mod cross_validation;
pub mod decision_tree;
pub mod gaussian_mixture;
pub mod linalg;
pub mod metrics;
pub mod random_forest;

pub use clustering::KMeans;
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{DecisionTree, TreeNode};
pub use gaussian_mixture::{CovarianceType, Covariances, GaussianMixture};
pub use metrics::{accuracy, calinski_harabasz_score, silhouette_score};
pub use random_forest::{MaxFeatures, RandomForest};
