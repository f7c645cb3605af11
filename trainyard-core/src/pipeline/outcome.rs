//! Terminal outcome of one pipeline run.

use crate::artifact::{ArtifactRef, StageKind};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Orchestrator state. Transitions are strictly linear in the order listed;
/// `Failed` is reachable from any non-terminal state, and `Completed` is
/// reached after `Pushing` or directly from `Evaluating` on a reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Ingesting,
    Validating,
    Transforming,
    Training,
    Evaluating,
    Pushing,
    Completed,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ingesting => "ingesting",
            Self::Validating => "validating",
            Self::Transforming => "transforming",
            Self::Training => "training",
            Self::Evaluating => "evaluating",
            Self::Pushing => "pushing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Record of one executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageKind,
    pub artifact: ArtifactRef,
    pub duration_ms: u64,
}

/// What one invocation of the pipeline produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub run_id: String,
    /// Terminal state: `Completed` or `Failed`.
    pub state: PipelineState,
    /// True only when the run completed via a successful registry push.
    pub promoted: bool,
    pub stages: Vec<StageRecord>,
    pub error: Option<PipelineError>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Completed
    }
}
