//! Model selection
//!
//! Grid searches over the mixture-model and forest configurations, the
//! reconciliation of cluster ids with diagnoses, and the feature-importance
//! ranking of the selected forest.

pub mod cluster_search;
pub mod config;
pub mod forest_search;
pub mod importance;
pub mod label_map;

use serde::{Deserialize, Serialize};

pub use cluster_search::{ClusterCandidate, ClusterModelSelector, ClusterSearchOutcome};
pub use config::{ClusterConfig, ClusterSearchConfig, ForestConfig, ForestSearchConfig};
pub use forest_search::{ForestCandidate, ForestModelSelector, ForestSearchOutcome};
pub use importance::{FeatureImportance, FeatureImportanceRanking};
pub use label_map::{
    align_clusters_to_classes, map_predictions, reconcile_labels, ClusterMap, EMPTY_CLUSTER_CLASS,
    MALIGNANT_MAJORITY_THRESHOLD,
};

/// A configuration that failed to fit and was excluded from selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFailure<C> {
    pub config: C,
    pub reason: String,
}
