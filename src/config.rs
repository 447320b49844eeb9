//! Pipeline-wide configuration

use crate::error::{CytodxError, Result};
use crate::preprocessing::PreprocessingConfig;
use crate::selection::{ClusterSearchConfig, ForestSearchConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Every tunable of a training run. Defaults reproduce the reference run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocessing: PreprocessingConfig,
    pub cluster_search: ClusterSearchConfig,
    pub forest_search: ForestSearchConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessing(mut self, config: PreprocessingConfig) -> Self {
        self.preprocessing = config;
        self
    }

    pub fn with_cluster_search(mut self, config: ClusterSearchConfig) -> Self {
        self.cluster_search = config;
        self
    }

    pub fn with_forest_search(mut self, config: ForestSearchConfig) -> Self {
        self.forest_search = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.preprocessing.iqr_factor.is_finite() && self.preprocessing.iqr_factor >= 0.0) {
            return Err(CytodxError::ConfigError(format!(
                "iqr_factor must be a non-negative number, got {}",
                self.preprocessing.iqr_factor
            )));
        }
        self.cluster_search.validate()?;
        self.forest_search.validate()
    }

    /// Read a JSON config; missing sections fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CytodxError::ConfigError(format!("cannot open config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
