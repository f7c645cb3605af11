//! Subcommand handlers.

use anyhow::Context;
use std::sync::Arc;
use trainyard_core::config::PipelineConfig;
use trainyard_core::data::DataSource;
use trainyard_core::pipeline::Orchestrator;
use trainyard_core::registry::{JsonRegistry, RegistryBackend};
use trainyard_core::schema::SchemaSpec;
use trainyard_core::stage::StageContext;

/// Execute one full pipeline run and report the outcome.
pub async fn run(config: PipelineConfig) -> anyhow::Result<()> {
    let source = Arc::from(config.source.build());
    let ctx = StageContext::prepare(config, source)?;
    let run_id = ctx.run_id.clone();

    let outcome = Orchestrator::new(ctx).run().await;
    tracing::info!(
        %run_id,
        state = %outcome.state,
        promoted = outcome.promoted,
        "pipeline finished"
    );

    println!("run {run_id}: {}", outcome.state);
    for record in &outcome.stages {
        println!("  {:<14} {:>6} ms", record.stage.to_string(), record.duration_ms);
    }
    if outcome.promoted {
        println!("candidate promoted to registry");
    } else if outcome.succeeded() {
        println!("candidate rejected by evaluation gate, registry unchanged");
    }

    match outcome.error {
        None => Ok(()),
        Some(err) => Err(err).context(format!("run {run_id} failed")),
    }
}

/// Fetch records and validate them against the schema, without training.
pub async fn validate(config: PipelineConfig) -> anyhow::Result<()> {
    let schema = SchemaSpec::load(&config.schema_path)?;
    let source = config.source.build();
    let dataset = source.fetch().await?;

    let report = trainyard_core::schema::validate(
        &dataset,
        &schema,
        config.validation.null_ratio_tolerance,
    );

    println!(
        "checked {} row(s) against {} column spec(s)",
        report.rows_checked,
        schema.columns.len()
    );
    if report.passed() {
        println!("validation passed");
        Ok(())
    } else {
        for (i, violation) in report.violations.iter().enumerate() {
            println!("  {}. {violation}", i + 1);
        }
        anyhow::bail!("validation failed with {} violation(s)", report.violations.len())
    }
}

/// Show the currently registered model.
pub fn registry(config: PipelineConfig) -> anyhow::Result<()> {
    let registry = JsonRegistry::new(config.registry_path);
    match registry.current()? {
        Some(model) => {
            println!("{}", serde_json::to_string_pretty(&model)?);
            Ok(())
        }
        None => {
            println!("no model registered yet");
            Ok(())
        }
    }
}
