//! Training stage — fit the classifier and score it on the held-out
//! partition.

use crate::artifact::blob::{read_json, write_json};
use crate::artifact::{Artifact, ArtifactPayload, StageKind};
use crate::error::PipelineError;
use crate::model;
use crate::stage::{Stage, StageContext, require_input};
use crate::transform::{FeatureMatrix, FittedTransform};
use async_trait::async_trait;
use tracing::info;

pub struct TrainStage;

#[async_trait]
impl Stage for TrainStage {
    fn kind(&self) -> StageKind {
        StageKind::Train
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        input: Option<&Artifact>,
    ) -> Result<Artifact, PipelineError> {
        let transformed = require_input(self.kind(), StageKind::Transform, input)?;
        let ArtifactPayload::TransformedDataset {
            transform,
            train,
            test,
            ..
        } = &transformed.payload
        else {
            return Err(PipelineError::not_found(
                "transformed dataset payload missing",
            ));
        };

        let blobs = ctx.blobs.as_ref();
        let fitted: FittedTransform = read_json(blobs, transform)?;
        let train_matrix: FeatureMatrix = read_json(blobs, train)?;
        let test_matrix: FeatureMatrix = read_json(blobs, test)?;

        let (trained, loss_history) =
            model::train(&train_matrix, &fitted.classes, &ctx.config.training)?;
        let metrics = trained.evaluate(&test_matrix);
        let final_loss = loss_history.last().copied().unwrap_or(f64::NAN);

        info!(
            epochs = ctx.config.training.epochs,
            final_loss,
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            "classifier trained"
        );

        let model_ref = write_json(blobs, &ctx.blob_key("model.json"), &trained)?;

        Ok(Artifact::new(
            &ctx.run_id,
            ArtifactPayload::TrainedModel {
                metrics,
                final_loss,
                model: model_ref,
            },
        ))
    }
}
