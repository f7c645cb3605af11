//! Pipeline orchestrator — sequences stages, persists artifacts between
//! transitions, and enforces fail-fast semantics.
//!
//! One orchestrator drives exactly one run. There are no retries and no
//! backward transitions; retry policy belongs to the caller driving repeated
//! runs. Every artifact is persisted before the next stage starts, so a
//! failure after stage N never loses stage N's output.

use crate::artifact::{Artifact, ArtifactPayload};
use crate::error::PipelineError;
use crate::pipeline::outcome::{PipelineOutcome, PipelineState, StageRecord};
use crate::stage::{
    EvaluateStage, IngestStage, PushStage, Stage, StageContext, TrainStage, TransformStage,
    ValidateStage,
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct Orchestrator {
    ctx: StageContext,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(ctx: StageContext) -> Self {
        Self {
            ctx,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for aborting this run between stages. Cancellation never
    /// interrupts a stage mid-flight; already persisted artifacts remain,
    /// and an aborted run can never promote.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the full pipeline once.
    pub async fn run(&self) -> PipelineOutcome {
        let run_id = self.ctx.run_id.clone();
        info!(%run_id, "pipeline run starting");

        let mut outcome = PipelineOutcome {
            run_id: run_id.clone(),
            state: PipelineState::Failed,
            promoted: false,
            stages: Vec::new(),
            error: None,
        };

        let linear: [(PipelineState, Box<dyn Stage>); 5] = [
            (PipelineState::Ingesting, Box::new(IngestStage)),
            (PipelineState::Validating, Box::new(ValidateStage)),
            (PipelineState::Transforming, Box::new(TransformStage)),
            (PipelineState::Training, Box::new(TrainStage)),
            (PipelineState::Evaluating, Box::new(EvaluateStage)),
        ];

        let mut previous: Option<Artifact> = None;
        for (state, stage) in &linear {
            match self
                .advance(*state, stage.as_ref(), previous.as_ref(), &mut outcome)
                .await
            {
                Some(artifact) => previous = Some(artifact),
                None => return outcome,
            }
        }

        let promote = match previous.as_ref().map(|a| &a.payload) {
            Some(ArtifactPayload::Evaluation { report, .. }) => report.decision.promote,
            _ => {
                outcome.error = Some(PipelineError::not_found("evaluation artifact missing"));
                return outcome;
            }
        };

        if promote {
            if self
                .advance(
                    PipelineState::Pushing,
                    &PushStage,
                    previous.as_ref(),
                    &mut outcome,
                )
                .await
                .is_none()
            {
                return outcome;
            }
            outcome.promoted = true;
        } else {
            info!(%run_id, "gate rejected candidate, skipping registry push");
        }

        outcome.state = PipelineState::Completed;
        info!(%run_id, promoted = outcome.promoted, "pipeline run completed");
        outcome
    }

    /// Run one stage: check cancellation, execute, persist the artifact,
    /// record the transition. On failure the outcome is finalized as Failed
    /// and `None` tells `run` to stop advancing.
    async fn advance(
        &self,
        state: PipelineState,
        stage: &dyn Stage,
        input: Option<&Artifact>,
        outcome: &mut PipelineOutcome,
    ) -> Option<Artifact> {
        if self.cancel.is_cancelled() {
            let err = PipelineError::Aborted(format!("cancelled before {state}"));
            error!(run_id = %self.ctx.run_id, %state, %err, "pipeline aborted");
            outcome.state = PipelineState::Failed;
            outcome.error = Some(err);
            return None;
        }

        info!(run_id = %self.ctx.run_id, %state, "pipeline state");
        let started = Instant::now();
        let result = async {
            let artifact = stage.execute(&self.ctx, input).await?;
            self.ctx.artifacts.put(&artifact)?;
            Ok::<_, PipelineError>(artifact)
        }
        .await;

        match result {
            Ok(artifact) => {
                outcome.stages.push(StageRecord {
                    stage: stage.kind(),
                    artifact: artifact.reference(),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                Some(artifact)
            }
            Err(err) => {
                error!(
                    run_id = %self.ctx.run_id,
                    stage = %stage.kind(),
                    %err,
                    "stage failed, halting pipeline"
                );
                outcome.state = PipelineState::Failed;
                outcome.error = Some(err);
                None
            }
        }
    }
}
