//! Transformation stage — split, then fit on the training partition only.
//!
//! The split happens before any transform parameter is computed, so held-out
//! information can never leak into the fit. The fitted transform is
//! persisted next to both transformed partitions.

use crate::artifact::blob::{read_json, write_json};
use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::data::Dataset;
use crate::error::PipelineError;
use crate::stage::{Stage, StageContext, require_input};
use crate::transform::{FittedTransform, split_dataset};
use async_trait::async_trait;
use tracing::info;

pub struct TransformStage;

#[async_trait]
impl Stage for TransformStage {
    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let validated = require_input(self.kind(), StageKind::Validate, input)?;
        let ArtifactPayload::ValidatedDataset { data, .. } = &validated.payload else {
            return Err(PipelineError::not_found("validated dataset payload missing"));
        };

        let dataset: Dataset = read_json(ctx.blobs.as_ref(), data)?;
        let (train, test) = split_dataset(
            &dataset,
            ctx.config.split.train_fraction,
            ctx.config.split.seed,
        )?;

        let fitted = FittedTransform::fit(&train, &ctx.schema, &ctx.config.target_column)?;
        let train_matrix = fitted.apply(&train)?;
        let test_matrix = fitted.apply(&test)?;

        info!(
            train_rows = train_matrix.row_count(),
            test_rows = test_matrix.row_count(),
            features = train_matrix.feature_count(),
            "features transformed"
        );

        let blobs = ctx.blobs.as_ref();
        let transform = write_json(blobs, &ctx.blob_key("transform.json"), &fitted)?;
        let train_ref = write_json(blobs, &ctx.blob_key("train_matrix.json"), &train_matrix)?;
        let test_ref = write_json(blobs, &ctx.blob_key("test_matrix.json"), &test_matrix)?;

        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::TransformedDataset {
                train_rows: train_matrix.row_count(),
                test_rows: test_matrix.row_count(),
                feature_count: train_matrix.feature_count(),
                transform,
                train: train_ref,
                test: test_ref,
            },
        ))
    }
}
