//! Artifact serialization utilities
//!
//! Binary artifacts are wrapped in a checksummed [`SerializedArtifact`]
//! envelope and written with bincode. JSON artifacts are written as plain
//! pretty-printed values.

use crate::error::{CytodxError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Artifact metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Artifact name (file stem)
    pub name: String,
    /// Crate version that wrote the artifact
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub model_type: String,
    pub hyperparameters: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
}

impl ArtifactMetadata {
    pub fn new(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            model_type: model_type.into(),
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_trained_at(mut self, trained_at: DateTime<Utc>) -> Self {
        self.trained_at = trained_at;
        self
    }

    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.hyperparameters.insert(key.into(), value.to_string());
        self
    }

    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Checksummed wrapper around a bincode payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedArtifact {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    pub format_version: u32,
    pub metadata: ArtifactMetadata,
    pub payload: Vec<u8>,
    pub checksum: u64,
}

impl SerializedArtifact {
    pub const MAGIC: [u8; 4] = [b'C', b'Y', b'D', b'X'];
    pub const VERSION: u32 = 1;

    pub fn new(metadata: ArtifactMetadata, payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            payload,
            checksum,
        }
    }

    /// FNV-1a hash of the payload
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = FNV_OFFSET;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.payload) == self.checksum
    }

    /// Check magic, version and checksum
    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(CytodxError::SerializationError(format!(
                "artifact '{}' has unrecognised magic bytes",
                self.metadata.name
            )));
        }
        if self.format_version > Self::VERSION {
            return Err(CytodxError::SerializationError(format!(
                "artifact '{}' uses format version {}, newest supported is {}",
                self.metadata.name,
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(CytodxError::SerializationError(format!(
                "checksum verification failed for artifact '{}', file may be corrupted",
                self.metadata.name
            )));
        }
        Ok(())
    }
}

/// Wrap `value` in an envelope and write it with bincode
pub fn write_binary<T: Serialize>(value: &T, path: impl AsRef<Path>, metadata: ArtifactMetadata) -> Result<()> {
    let payload = bincode::serialize(value)?;
    let envelope = SerializedArtifact::new(metadata, payload);

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

/// Read an enveloped bincode artifact, verifying its integrity first
pub fn read_binary<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<(T, ArtifactMetadata)> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let envelope: SerializedArtifact = bincode::deserialize(&bytes)?;
    envelope.validate()?;

    let value = bincode::deserialize(&envelope.payload)?;
    Ok((value, envelope.metadata))
}

pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
