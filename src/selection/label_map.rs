//! Bridging cluster ids and clinical classes
//!
//! Two related policies live here:
//! - [`align_clusters_to_classes`] scores a candidate clustering during the
//!   search (majority class per cluster, empty clusters default to benign).
//! - [`reconcile_labels`] builds the persisted [`ClusterMap`] for the final
//!   model (malignant only when strictly more than half of the members are).

use crate::data::{Diagnosis, BENIGN_CLASS, MALIGNANT_CLASS};
use crate::error::{CytodxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Class assigned to a cluster that received no samples during alignment
pub const EMPTY_CLUSTER_CLASS: i32 = BENIGN_CLASS;

/// A cluster maps to malignant only when its malignant fraction exceeds this
pub const MALIGNANT_MAJORITY_THRESHOLD: f64 = 0.5;

/// Majority ground-truth class per cluster id `0..n_components`.
///
/// Ties between classes resolve to the lower class code (benign); clusters
/// with no members get [`EMPTY_CLUSTER_CLASS`].
pub fn align_clusters_to_classes(assignments: &[usize], labels: &[i32], n_components: usize) -> Vec<i32> {
    let mut votes: Vec<BTreeMap<i32, usize>> = vec![BTreeMap::new(); n_components];
    for (&cluster, &label) in assignments.iter().zip(labels) {
        if cluster < n_components {
            *votes[cluster].entry(label).or_insert(0) += 1;
        }
    }

    votes
        .iter()
        .map(|counts| {
            counts
                .iter()
                .fold(None, |best: Option<(i32, usize)>, (&class, &n)| match best {
                    Some((_, best_n)) if best_n >= n => best,
                    _ => Some((class, n)),
                })
                .map_or(EMPTY_CLUSTER_CLASS, |(class, _)| class)
        })
        .collect()
}

/// Replace each cluster id by its aligned class
pub fn map_predictions(assignments: &[usize], cluster_to_class: &[i32]) -> Vec<i32> {
    assignments
        .iter()
        .map(|&c| cluster_to_class.get(c).copied().unwrap_or(EMPTY_CLUSTER_CLASS))
        .collect()
}

/// Cluster id → diagnosis, fixed after training
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterMap {
    entries: BTreeMap<usize, Diagnosis>,
}

impl ClusterMap {
    pub fn new(entries: BTreeMap<usize, Diagnosis>) -> Self {
        Self { entries }
    }

    /// Diagnosis for a cluster id, failing on ids the map does not cover
    pub fn diagnosis(&self, cluster: usize) -> Result<Diagnosis> {
        self.entries
            .get(&cluster)
            .copied()
            .ok_or(CytodxError::UnknownCluster(cluster))
    }

    pub fn contains(&self, cluster: usize) -> bool {
        self.entries.contains_key(&cluster)
    }

    /// Cluster ids in ascending order
    pub fn clusters(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Diagnosis)> + '_ {
        self.entries.iter().map(|(&c, &d)| (c, d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the cluster map for every cluster id present in `assignments`
pub fn reconcile_labels(assignments: &[usize], labels: &[i32]) -> Result<ClusterMap> {
    if assignments.len() != labels.len() {
        return Err(CytodxError::ShapeError {
            expected: format!("{} labels", assignments.len()),
            actual: format!("{} labels", labels.len()),
        });
    }
    if assignments.is_empty() {
        return Err(CytodxError::TrainingDataError(
            "no cluster assignments to reconcile".to_string(),
        ));
    }

    let mut tallies: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (&cluster, &label) in assignments.iter().zip(labels) {
        let entry = tallies.entry(cluster).or_insert((0, 0));
        entry.0 += 1;
        if label == MALIGNANT_CLASS {
            entry.1 += 1;
        }
    }

    let entries = tallies
        .into_iter()
        .map(|(cluster, (total, malignant))| {
            let fraction = malignant as f64 / total as f64;
            let diagnosis = if fraction > MALIGNANT_MAJORITY_THRESHOLD {
                Diagnosis::Malignant
            } else {
                Diagnosis::Benign
            };
            debug!(cluster, total, malignant_fraction = fraction, diagnosis = %diagnosis, "reconciled cluster");
            (cluster, diagnosis)
        })
        .collect();

    Ok(ClusterMap::new(entries))
}
