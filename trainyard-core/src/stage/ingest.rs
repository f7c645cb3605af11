//! Ingest stage — fetch raw records and persist them as the run's first
//! artifact.

use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::data::DataSource;
use crate::error::PipelineError;
use crate::stage::{Stage, StageContext};
use async_trait::async_trait;
use tracing::info;

pub struct IngestStage;

#[async_trait]
impl Stage for IngestStage {
    fn kind(&self) -> StageKind {
        StageKind::Ingest
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        _input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let dataset = ctx.source.fetch().await?;
        if dataset.row_count() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        info!(
            source = %ctx.source.location(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "raw records ingested"
        );

        let data = crate::artifact::blob::write_json(
            ctx.blobs.as_ref(),
            &ctx.blob_key("raw.json"),
            &dataset,
        )?;

        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::RawDataset {
                source: ctx.source.location(),
                rows: dataset.row_count(),
                columns: dataset.column_count(),
                null_ratios: dataset.null_ratios(),
                data,
            },
        ))
    }
}
