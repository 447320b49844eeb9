//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Configuration for the feature preparer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Token marking an unknown measurement in raw files
    pub missing_marker: String,

    /// Skew-prone feature whose values are clipped to IQR bounds.
    /// `None` disables clipping.
    pub clip_feature: Option<String>,

    /// Multiplier applied to the IQR when computing clip bounds
    pub iqr_factor: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            missing_marker: "?".to_string(),
            clip_feature: Some("Mitoses".to_string()),
            iqr_factor: 1.5,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_marker(mut self, marker: impl Into<String>) -> Self {
        self.missing_marker = marker.into();
        self
    }

    pub fn with_clip_feature(mut self, feature: Option<String>) -> Self {
        self.clip_feature = feature;
        self
    }

    pub fn with_iqr_factor(mut self, factor: f64) -> Self {
        self.iqr_factor = factor;
        self
    }
}
