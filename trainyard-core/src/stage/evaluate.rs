//! Evaluation stage — compare the candidate against the registered baseline
//! through the gate.

use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::error::PipelineError;
use crate::gate::{self, EvaluationReport};
use crate::registry::RegistryBackend;
use crate::stage::{Stage, StageContext, require_input};
use async_trait::async_trait;
use tracing::warn;

pub struct EvaluateStage;

#[async_trait]
impl Stage for EvaluateStage {
    fn kind(&self) -> StageKind {
        StageKind::Evaluate
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let trained = require_input(self.kind(), StageKind::Train, input)?;
        let ArtifactPayload::TrainedModel { metrics, model, .. } = &trained.payload else {
            return Err(PipelineError::not_found("trained model payload missing"));
        };

        let gate_config = &ctx.config.gate;
        let candidate = gate_config.metric.value_of(metrics);

        let baseline = match ctx.registry.current()? {
            None => None,
            Some(registered) if registered.metric.name == gate_config.metric.name() => {
                Some(registered.metric.value)
            }
            Some(registered) => {
                // The registered model was gated on a different metric; its
                // value is not comparable, so the candidate is treated as
                // having no baseline.
                warn!(
                    registered_metric = %registered.metric.name,
                    configured_metric = gate_config.metric.name(),
                    "baseline metric mismatch, treating baseline as absent"
                );
                None
            }
        };

        let decision = gate::decide(
            candidate,
            baseline,
            gate_config.threshold,
            gate_config.orientation,
        );

        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::Evaluation {
                report: EvaluationReport {
                    metric: gate_config.metric.name().to_string(),
                    decision,
                },
                model: model.clone(),
            },
        ))
    }
}
