//! Stage interface — the uniform contract every pipeline stage implements.
//!
//! A stage consumes the immediately preceding artifact plus configuration,
//! produces a new artifact, and fails only with a typed `PipelineError`.
//! Stages never mutate input artifacts and are deterministic given the same
//! config and input, modulo the explicitly seeded randomness of splitting.

pub mod evaluate;
pub mod ingest;
pub mod push;
pub mod train;
pub mod transform;
pub mod validate;

pub use evaluate::EvaluateStage;
pub use ingest::IngestStage;
pub use push::PushStage;
pub use train::TrainStage;
pub use transform::TransformStage;
pub use validate::ValidateStage;

use crate::artifact::{Artifact, ArtifactStore, BlobStore, StageKind};
use crate::config::PipelineConfig;
use crate::data::DataSource;
use crate::error::PipelineError;
use crate::registry::RegistryBackend;
use crate::schema::SchemaSpec;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a stage needs, threaded explicitly. No globals.
pub struct StageContext {
    pub run_id: String,
    pub config: PipelineConfig,
    pub schema: SchemaSpec,
    pub artifacts: ArtifactStore,
    pub blobs: Arc<dyn BlobStore>,
    pub source: Arc<dyn DataSource>,
    pub registry: Arc<dyn RegistryBackend>,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl StageContext {
    /// Build a context for a fresh run with the default filesystem-backed
    /// collaborators.
    ///
    /// Fails with a `Config` error before any stage runs when the
    /// configuration or the schema is invalid.
    pub fn prepare(
        config: PipelineConfig,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let schema = SchemaSpec::load(&config.schema_path)?;
        let artifacts = ArtifactStore::new(config.artifact_root.join("runs"));
        let blobs = Arc::new(crate::artifact::FsBlobStore::new(
            config.artifact_root.join("blobs"),
        ));
        let registry = Arc::new(crate::registry::JsonRegistry::new(
            config.registry_path.clone(),
        ));
        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            schema,
            artifacts,
            blobs,
            source,
            registry,
        })
    }

    /// Blob key scoped to this run.
    pub fn blob_key(&self, name: &str) -> String {
        format!("{}/{name}", self.run_id)
    }
}

/// One pipeline stage.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Run the stage. `input` is the artifact of the immediately preceding
    /// stage; only the first stage runs without one.
    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError>;
}

/// Fetch the input artifact a stage requires, checking its variant.
pub(crate) fn require_input<'a>(
    kind: StageKind,
    expected: StageKind,
    input: Option<&'a Artifact>,
) -> Result<&'a Artifact, PipelineError> {
    match input {
        Some(artifact) if artifact.stage == expected => Ok(artifact),
        Some(artifact) => Err(PipelineError::not_found(format!(
            "stage {kind} expected a {expected} artifact as input, got {}",
            artifact.stage
        ))),
        None => Err(PipelineError::not_found(format!(
            "stage {kind} expected a {expected} artifact as input, got none"
        ))),
    }
}
