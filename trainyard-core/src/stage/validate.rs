//! Validation stage — exhaustive schema check, separated from any
//! transformation: "is the data well-formed" comes strictly before "is the
//! data model-ready".

use crate::artifact::blob::read_json;
use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::data::Dataset;
use crate::error::PipelineError;
use crate::schema;
use crate::stage::{Stage, StageContext, require_input};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct ValidateStage;

#[async_trait]
impl Stage for ValidateStage {
    fn kind(&self) -> StageKind {
        StageKind::Validate
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let raw = require_input(self.kind(), StageKind::Ingest, input)?;
        let ArtifactPayload::RawDataset { data, .. } = &raw.payload else {
            return Err(PipelineError::not_found("raw dataset payload missing"));
        };

        let dataset: Dataset = read_json(ctx.blobs.as_ref(), data)?;
        let report = schema::validate(
            &dataset,
            &ctx.schema,
            ctx.config.validation.null_ratio_tolerance,
        );

        if !report.passed() {
            for violation in &report.violations {
                warn!(%violation, "schema violation");
            }
            return Err(PipelineError::Validation(report));
        }

        info!(rows = report.rows_checked, "schema validation passed");

        // The dataset passes through unchanged; the validated artifact
        // references the same blob the raw artifact does.
        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::ValidatedDataset {
                rows: dataset.row_count(),
                schema_fingerprint: ctx.schema.fingerprint(),
                data: data.clone(),
            },
        ))
    }
}
