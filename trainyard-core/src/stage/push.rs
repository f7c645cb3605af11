//! Registry push stage — atomically replace the served model.
//!
//! Only invoked after a promote decision. A failed write marks the run
//! Failed even though evaluation succeeded: an un-pushed promotion must
//! never be reported as success.

use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::error::PipelineError;
use crate::registry::{MetricSnapshot, ModelCandidate, RegistryBackend};
use crate::stage::{Stage, StageContext, require_input};
use async_trait::async_trait;

pub struct PushStage;

#[async_trait]
impl Stage for PushStage {
    fn kind(&self) -> StageKind {
        StageKind::RegistryPush
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let evaluation = require_input(self.kind(), StageKind::Evaluate, input)?;
        let ArtifactPayload::Evaluation { report, model } = &evaluation.payload else {
            return Err(PipelineError::not_found("evaluation payload missing"));
        };
        if !report.decision.promote {
            return Err(PipelineError::registry_write(
                "push invoked for a reject decision",
            ));
        }

        let registered = ctx.registry.promote(ModelCandidate {
            run_id: ctx.run_id.clone(),
            model_uri: model.key.clone(),
            metric: MetricSnapshot {
                name: report.metric.clone(),
                value: report.decision.candidate,
            },
            schema_fingerprint: ctx.schema.fingerprint(),
        })?;

        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::RegistryPush {
                model_id: registered.model_id,
                version: registered.version,
            },
        ))
    }
}
