//! Classification and clustering quality metrics

use crate::error::{CytodxError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Fraction of predictions equal to the ground truth
pub fn accuracy<T: PartialEq>(predicted: &[T], actual: &[T]) -> f64 {
    if predicted.is_empty() || predicted.len() != actual.len() {
        return 0.0;
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    correct as f64 / predicted.len() as f64
}

/// Number of distinct labels actually assigned
pub fn n_populated(labels: &[usize]) -> usize {
    let mut seen: Vec<usize> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

fn check_labels(x: &Array2<f64>, labels: &[usize]) -> Result<usize> {
    if x.nrows() != labels.len() {
        return Err(CytodxError::ShapeError {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", labels.len()),
        });
    }
    let k = n_populated(labels);
    if k < 2 || k >= x.nrows() {
        return Err(CytodxError::TrainingError(format!(
            "clustering metrics need 2 <= n_labels <= n_samples - 1, got {} labels for {} samples",
            k,
            x.nrows()
        )));
    }
    Ok(k)
}

/// Mean silhouette coefficient over all samples (Euclidean distance).
///
/// Samples alone in their cluster score 0.
pub fn silhouette_score(x: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    check_labels(x, labels)?;

    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for &l in labels {
        *sizes.entry(l).or_insert(0) += 1;
    }

    let scores: Vec<f64> = (0..x.nrows())
        .into_par_iter()
        .map(|i| {
            let own = labels[i];
            if sizes[&own] <= 1 {
                return 0.0;
            }

            let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
            for j in 0..x.nrows() {
                if i != j {
                    *sums.entry(labels[j]).or_insert(0.0) += euclidean(x.row(i), x.row(j));
                }
            }

            let a = sums.get(&own).copied().unwrap_or(0.0) / (sizes[&own] - 1) as f64;
            let b = sums
                .iter()
                .filter(|(l, _)| **l != own)
                .map(|(l, s)| s / sizes[l] as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Ratio of between-cluster to within-cluster dispersion (Calinski–Harabasz index)
pub fn calinski_harabasz_score(x: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let k = check_labels(x, labels)?;
    let n = x.nrows();
    let overall_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &l) in labels.iter().enumerate() {
        members.entry(l).or_default().push(i);
    }

    let mut between = 0.0;
    let mut within = 0.0;
    for rows in members.values() {
        let cluster = x.select(Axis(0), rows);
        let centroid = cluster.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        between += rows.len() as f64 * (&centroid - &overall_mean).mapv(|v| v * v).sum();
        within += (&cluster - &centroid).mapv(|v| v * v).sum();
    }

    if within == 0.0 {
        return Ok(1.0);
    }
    Ok(between * (n - k) as f64 / (within * (k - 1) as f64))
}
