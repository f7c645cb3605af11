//! Typed, immutable records produced by pipeline stages.

use crate::artifact::blob::BlobRef;
use crate::gate::EvaluationReport;
use crate::model::ClassificationMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a pipeline stage. Closed set; dispatch over stages is static.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Ingest,
    Validate,
    Transform,
    Train,
    Evaluate,
    RegistryPush,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::RegistryPush => "registry_push",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-specific artifact payload.
///
/// Each variant carries references to its file-backed payloads plus the
/// summary metadata downstream stages and operators need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactPayload {
    RawDataset {
        source: String,
        rows: usize,
        columns: usize,
        null_ratios: BTreeMap<String, f64>,
        data: BlobRef,
    },
    ValidatedDataset {
        rows: usize,
        schema_fingerprint: String,
        /// Validation passes the dataset through unchanged, so this points
        /// at the same blob the raw artifact does.
        data: BlobRef,
    },
    TransformedDataset {
        train_rows: usize,
        test_rows: usize,
        feature_count: usize,
        transform: BlobRef,
        train: BlobRef,
        test: BlobRef,
    },
    TrainedModel {
        metrics: ClassificationMetrics,
        final_loss: f64,
        model: BlobRef,
    },
    Evaluation {
        report: EvaluationReport,
        /// Carried forward so the push stage needs only this artifact.
        model: BlobRef,
    },
    RegistryPush {
        model_id: String,
        version: u64,
    },
}

impl ArtifactPayload {
    /// The stage that produces this payload variant.
    pub fn stage(&self) -> StageKind {
        match self {
            Self::RawDataset { .. } => StageKind::Ingest,
            Self::ValidatedDataset { .. } => StageKind::Validate,
            Self::TransformedDataset { .. } => StageKind::Transform,
            Self::TrainedModel { .. } => StageKind::Train,
            Self::Evaluation { .. } => StageKind::Evaluate,
            Self::RegistryPush { .. } => StageKind::RegistryPush,
        }
    }
}

/// One immutable stage output, keyed by `(run_id, stage)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub run_id: String,
    pub stage: StageKind,
    pub payload: ArtifactPayload,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(run_id: &str, payload: ArtifactPayload) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: payload.stage(),
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            run_id: self.run_id.clone(),
            stage: self.stage,
        }
    }
}

/// Opaque reference addressing one artifact in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub run_id: String,
    pub stage: StageKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_stage_mapping() {
        let payload = ArtifactPayload::RegistryPush {
            model_id: "m-1".into(),
            version: 3,
        };
        assert_eq!(payload.stage(), StageKind::RegistryPush);

        let artifact = Artifact::new("run-1", payload);
        assert_eq!(artifact.stage, StageKind::RegistryPush);
        assert_eq!(artifact.reference().run_id, "run-1");
    }

    #[test]
    fn test_stage_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StageKind::RegistryPush).unwrap();
        assert_eq!(json, "\"registry_push\"");
    }
}
