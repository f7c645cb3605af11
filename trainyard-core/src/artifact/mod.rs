//! Artifact storage — typed stage outputs and their file-backed payloads.

pub mod blob;
pub mod store;
pub mod types;

pub use blob::{BlobRef, BlobStore, FsBlobStore};
pub use store::ArtifactStore;
pub use types::{Artifact, ArtifactPayload, ArtifactRef, StageKind};
