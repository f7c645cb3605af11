//! Artifact store — durable, content-addressed stage outputs.
//!
//! Artifacts are addressed by `(run_id, stage)`: re-running a stage for the
//! same run id overwrites deterministically instead of accumulating history.
//! Payload blobs are written in full before the metadata record is
//! published, so readers never observe a partial artifact.

use crate::artifact::types::{Artifact, ArtifactRef, StageKind};
use crate::error::PipelineError;
use crate::persistence::{atomic_write_json, load_json};
use std::path::PathBuf;
use tracing::debug;

/// Filesystem-backed artifact store.
///
/// Layout: `<root>/<run_id>/<stage>.json` per artifact record.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn record_path(&self, run_id: &str, stage: StageKind) -> PathBuf {
        self.root.join(run_id).join(format!("{}.json", stage.as_str()))
    }

    /// Publish an artifact, overwriting any previous record for the same
    /// `(run_id, stage)`.
    pub fn put(&self, artifact: &Artifact) -> Result<ArtifactRef, PipelineError> {
        let path = self.record_path(&artifact.run_id, artifact.stage);
        atomic_write_json(&path, artifact)?;
        debug!(run_id = %artifact.run_id, stage = %artifact.stage, "artifact published");
        Ok(artifact.reference())
    }

    /// Fetch an artifact by reference.
    pub fn get(&self, reference: &ArtifactRef) -> Result<Artifact, PipelineError> {
        load_json(&self.record_path(&reference.run_id, reference.stage))?.ok_or_else(|| {
            PipelineError::not_found(format!(
                "artifact {}/{}",
                reference.run_id, reference.stage
            ))
        })
    }

    /// All artifacts recorded for a run, in stage order.
    pub fn list(&self, run_id: &str) -> Result<Vec<Artifact>, PipelineError> {
        const ORDER: [StageKind; 6] = [
            StageKind::Ingest,
            StageKind::Validate,
            StageKind::Transform,
            StageKind::Train,
            StageKind::Evaluate,
            StageKind::RegistryPush,
        ];
        let mut artifacts = Vec::new();
        for stage in ORDER {
            if let Some(artifact) = load_json(&self.record_path(run_id, stage))? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }
}
