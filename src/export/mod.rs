//! Artifact persistence
//!
//! - Checksummed bincode envelopes for fitted models
//! - Pretty-printed JSON for the scaler, cluster map and importance ranking
//! - [`ArtifactStore`], the five-file directory shared by training and inference

mod artifact_store;
mod serializer;

pub use artifact_store::{
    ArtifactStore, ModelArtifacts, ARTIFACT_FILES, CLUSTER_MAP_FILE, CLUSTER_MODEL_FILE, FOREST_MODEL_FILE,
    IMPORTANCE_FILE, SCALER_FILE,
};
pub use serializer::{read_binary, read_json, write_binary, write_json, ArtifactMetadata, SerializedArtifact};
