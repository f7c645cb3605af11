//! End-to-end pipeline runs against a temp workspace.

use pretty_assertions::{assert_eq, assert_ne};
use std::path::Path;
use std::sync::Arc;

use trainyard_core::artifact::StageKind;
use trainyard_core::config::PipelineConfig;
use trainyard_core::data::{Dataset, InMemorySource};
use trainyard_core::error::PipelineError;
use trainyard_core::pipeline::{Orchestrator, PipelineState};
use trainyard_core::registry::{JsonRegistry, RegistryBackend};
use trainyard_core::stage::StageContext;

/// Linearly separable records: label is "yes" exactly when x is positive.
fn separable_dataset(rows: usize) -> Dataset {
    let mut data = Vec::with_capacity(rows);
    for i in 0..rows {
        let positive = i % 2 == 0;
        let x = if positive { 1.0 } else { -1.0 } + (i % 7) as f64 * 0.01;
        let segment = if i % 3 == 0 { "a" } else { "b" };
        let label = if positive { "yes" } else { "no" };
        data.push(vec![
            serde_json::json!(x),
            serde_json::json!(segment),
            serde_json::json!(label),
        ]);
    }
    Dataset::new(
        vec!["x".into(), "segment".into(), "label".into()],
        data,
    )
}

fn write_schema(dir: &Path) -> std::path::PathBuf {
    let schema = serde_json::json!({
        "columns": [
            { "name": "x", "dtype": "float", "nullable": false },
            {
                "name": "segment",
                "dtype": "string",
                "nullable": false,
                "constraint": { "type": "domain", "allowed": ["a", "b"] }
            },
            { "name": "label", "dtype": "string", "nullable": false }
        ]
    });
    let path = dir.join("schema.json");
    std::fs::write(&path, serde_json::to_string_pretty(&schema).unwrap()).unwrap();
    path
}

fn config_for(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.schema_path = write_schema(dir);
    config.artifact_root = dir.join("artifacts");
    config.registry_path = dir.join("registry.json");
    config.target_column = "label".into();
    config
}

fn context(dir: &Path, dataset: Dataset) -> StageContext {
    StageContext::prepare(config_for(dir), Arc::new(InMemorySource::new(dataset))).unwrap()
}

#[tokio::test]
async fn test_full_run_completes_and_promotes_without_baseline() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), separable_dataset(60));
    let run_id = ctx.run_id.clone();
    let store_root = dir.path().join("artifacts").join("runs");

    let outcome = Orchestrator::new(ctx).run().await;

    assert_eq!(outcome.state, PipelineState::Completed, "{:?}", outcome.error);
    assert!(outcome.promoted);
    assert_eq!(
        outcome.stages.iter().map(|s| s.stage).collect::<Vec<_>>(),
        vec![
            StageKind::Ingest,
            StageKind::Validate,
            StageKind::Transform,
            StageKind::Train,
            StageKind::Evaluate,
            StageKind::RegistryPush,
        ]
    );

    // Every stage artifact is durably published under the run id.
    let store = trainyard_core::ArtifactStore::new(store_root);
    assert_eq!(store.list(&run_id).unwrap().len(), 6);

    // First-ever promotion lands as version 1.
    let registry = JsonRegistry::new(dir.path().join("registry.json"));
    let current = registry.current().unwrap().unwrap();
    assert_eq!(current.version, 1);
    assert_eq!(current.run_id, run_id);
    assert_eq!(current.metric.name, "accuracy");
}

#[tokio::test]
async fn test_second_run_without_improvement_is_rejected_not_failed() {
    let dir = tempfile::TempDir::new().unwrap();

    let first = Orchestrator::new(context(dir.path(), separable_dataset(60)))
        .run()
        .await;
    assert!(first.promoted);

    // Identical data trains an identical model, so the candidate cannot
    // clear the 0.02 margin over its own baseline.
    let second_ctx = context(dir.path(), separable_dataset(60));
    let second_run = second_ctx.run_id.clone();
    let second = Orchestrator::new(second_ctx).run().await;

    assert_eq!(second.state, PipelineState::Completed);
    assert!(!second.promoted);
    // The reject path skips the push stage entirely.
    assert!(
        second
            .stages
            .iter()
            .all(|s| s.stage != StageKind::RegistryPush)
    );

    // The registry still serves the first run's model.
    let registry = JsonRegistry::new(dir.path().join("registry.json"));
    let current = registry.current().unwrap().unwrap();
    assert_eq!(current.version, 1);
    assert_ne!(current.run_id, second_run);
}

#[tokio::test]
async fn test_empty_source_fails_before_validation() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), Dataset::empty());
    let run_id = ctx.run_id.clone();

    let outcome = Orchestrator::new(ctx).run().await;

    assert_eq!(outcome.state, PipelineState::Failed);
    assert!(matches!(outcome.error, Some(PipelineError::EmptyDataset)));
    assert!(outcome.stages.is_empty());

    // Ingest failed, so validation never executed and nothing was persisted.
    let store = trainyard_core::ArtifactStore::new(dir.path().join("artifacts").join("runs"));
    assert!(store.list(&run_id).unwrap().is_empty());

    // A failed run never touches the registry.
    let registry = JsonRegistry::new(dir.path().join("registry.json"));
    assert!(registry.current().unwrap().is_none());
}

#[tokio::test]
async fn test_validation_failure_reports_all_violations_and_halts() {
    let dir = tempfile::TempDir::new().unwrap();

    // Two independent defects: segment outside its domain and a non-float x.
    let mut dataset = separable_dataset(20);
    dataset.rows[0][0] = serde_json::json!("not-a-number");
    dataset.rows[1][1] = serde_json::json!("c");

    let ctx = context(dir.path(), dataset);
    let run_id = ctx.run_id.clone();
    let outcome = Orchestrator::new(ctx).run().await;

    assert_eq!(outcome.state, PipelineState::Failed);
    let Some(PipelineError::Validation(report)) = outcome.error else {
        panic!("expected validation failure, got {:?}", outcome.error);
    };
    assert_eq!(report.violations.len(), 2);

    // The raw artifact survives the failure; no later artifact exists.
    let store = trainyard_core::ArtifactStore::new(dir.path().join("artifacts").join("runs"));
    let artifacts = store.list(&run_id).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].stage, StageKind::Ingest);
}

#[tokio::test]
async fn test_cancelled_run_aborts_between_stages() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), separable_dataset(60));
    let run_id = ctx.run_id.clone();

    let orchestrator = Orchestrator::new(ctx);
    orchestrator.cancellation_token().cancel();
    let outcome = orchestrator.run().await;

    assert_eq!(outcome.state, PipelineState::Failed);
    assert!(matches!(outcome.error, Some(PipelineError::Aborted(_))));

    // Aborted before ingest: no artifacts, and certainly no promotion.
    let store = trainyard_core::ArtifactStore::new(dir.path().join("artifacts").join("runs"));
    assert!(store.list(&run_id).unwrap().is_empty());
    let registry = JsonRegistry::new(dir.path().join("registry.json"));
    assert!(registry.current().unwrap().is_none());
}

#[tokio::test]
async fn test_missing_schema_halts_before_any_stage() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config_for(dir.path());
    config.schema_path = dir.path().join("absent-schema.json");

    let err = StageContext::prepare(
        config,
        Arc::new(InMemorySource::new(separable_dataset(10))),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[tokio::test]
async fn test_rerun_of_same_run_id_overwrites_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), separable_dataset(60));
    let run_id = ctx.run_id.clone();
    let orchestrator = Orchestrator::new(ctx);

    orchestrator.run().await;
    let store = trainyard_core::ArtifactStore::new(dir.path().join("artifacts").join("runs"));
    let first_count = store.list(&run_id).unwrap().len();

    // Driving the same orchestrator again re-executes every stage for the
    // same run id; artifacts overwrite deterministically instead of piling
    // up history.
    orchestrator.run().await;
    assert_eq!(store.list(&run_id).unwrap().len(), first_count);
}
