//! Delivery artifacts: a versioned, file-backed registry of stage outputs.

mod manager;
mod types;

pub use manager::{ArtifactStoreConfig, DeliveryArtifactsManager};
pub use types::{
    ArtifactConfig, ArtifactConfigUpdate, ArtifactFormat, ArtifactMetadata, ArtifactStatistics,
    ArtifactType, FileContent, ValidationResult,
};
