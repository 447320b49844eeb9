//! Tabular cytology records
//!
//! A [`Sample`] is one row of nine cytological measurements plus its
//! ground-truth class code; a [`Dataset`] is an ordered collection of
//! samples sharing one feature schema.

mod loader;

pub use loader::DatasetLoader;

use crate::error::{CytodxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Canonical feature order of the cytology schema
pub const FEATURE_NAMES: [&str; 9] = [
    "Clump_thickness",
    "Uniformity_of_cell_size",
    "Uniformity_of_cell_shape",
    "Marginal_adhesion",
    "Single_epithelial_cell_size",
    "Bare_nuclei",
    "Bland_chromatin",
    "Normal_nucleoli",
    "Mitoses",
];

/// Name of the ground-truth column
pub const LABEL_COLUMN: &str = "Class";

/// Class code for benign tissue
pub const BENIGN_CLASS: i32 = 2;

/// Class code for malignant tissue
pub const MALIGNANT_CLASS: i32 = 4;

/// Clinical outcome attached to a cluster or a classifier prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Benign,
    Malignant,
}

impl Diagnosis {
    /// Map a class code (2 or 4) to a diagnosis
    pub fn from_class(class: i32) -> Result<Self> {
        match class {
            BENIGN_CLASS => Ok(Diagnosis::Benign),
            MALIGNANT_CLASS => Ok(Diagnosis::Malignant),
            other => Err(CytodxError::TrainingDataError(format!(
                "class label must be {} or {}, got {}",
                BENIGN_CLASS, MALIGNANT_CLASS, other
            ))),
        }
    }

    /// Class code of this diagnosis
    pub fn class(&self) -> i32 {
        match self {
            Diagnosis::Benign => BENIGN_CLASS,
            Diagnosis::Malignant => MALIGNANT_CLASS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Benign => "Benign",
            Diagnosis::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled record. `None` marks a value recorded as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<Option<f64>>,
    pub label: i32,
}

impl Sample {
    pub fn new(features: Vec<Option<f64>>, label: i32) -> Self {
        Self { features, label }
    }

    /// Build a sample with every feature observed
    pub fn complete(features: &[f64], label: i32) -> Self {
        Self {
            features: features.iter().map(|&v| Some(v)).collect(),
            label,
        }
    }

    fn dedup_key(&self) -> (Vec<Option<u64>>, i32) {
        let key = self
            .features
            .iter()
            .map(|v| v.map(|x| if x == 0.0 { 0 } else { x.to_bits() }))
            .collect();
        (key, self.label)
    }
}

/// Ordered collection of samples with a shared feature schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    feature_names: Vec<String>,
    samples: Vec<Sample>,
}

impl Dataset {
    /// Create a dataset, validating width and labels of every sample.
    ///
    /// Rows are kept as given; see [`Dataset::deduplicated`].
    pub fn new(feature_names: Vec<String>, samples: Vec<Sample>) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(CytodxError::TrainingDataError(
                "dataset has no feature columns".to_string(),
            ));
        }

        for (row, sample) in samples.iter().enumerate() {
            if sample.features.len() != feature_names.len() {
                return Err(CytodxError::TrainingDataError(format!(
                    "row {} has {} features, expected {}",
                    row,
                    sample.features.len(),
                    feature_names.len()
                )));
            }
            Diagnosis::from_class(sample.label)?;
        }

        Ok(Self { feature_names, samples })
    }

    /// Create a dataset using the canonical nine-feature schema
    pub fn with_standard_schema(samples: Vec<Sample>) -> Result<Self> {
        Self::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect(), samples)
    }

    /// Copy of this dataset with exact duplicate rows removed (first occurrence kept)
    pub fn deduplicated(&self) -> Self {
        let mut seen = HashSet::new();
        let samples = self
            .samples
            .iter()
            .filter(|s| seen.insert(s.dedup_key()))
            .cloned()
            .collect();

        Self {
            feature_names: self.feature_names.clone(),
            samples,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Column index of a feature, matched case-insensitively
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names
            .iter()
            .position(|f| f.eq_ignore_ascii_case(name))
    }

    /// Class codes in row order
    pub fn labels(&self) -> Vec<i32> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Number of unknown values per feature
    pub fn missing_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_features()];
        for sample in &self.samples {
            for (j, value) in sample.features.iter().enumerate() {
                if value.is_none() {
                    counts[j] += 1;
                }
            }
        }
        counts
    }
}
