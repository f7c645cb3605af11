//! Model registry — the one piece of state that outlives a pipeline run.
//!
//! The registry holds the currently served model reference. It is replaced
//! only by an explicit promotion; concurrent promotions are serialized so
//! the record is never a mix of two candidates. Full version history belongs
//! to an external registry, not here.

use crate::error::PipelineError;
use crate::persistence::{atomic_write_json, load_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// The recorded evaluation metric of a registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub name: String,
    pub value: f64,
}

/// A model proposed for promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub run_id: String,
    /// Opaque storage location of the model payload.
    pub model_uri: String,
    pub metric: MetricSnapshot,
    pub schema_fingerprint: String,
}

/// The currently served model reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub model_id: String,
    pub run_id: String,
    pub version: u64,
    pub model_uri: String,
    pub metric: MetricSnapshot,
    pub schema_fingerprint: String,
    pub promoted_at: DateTime<Utc>,
}

/// Backend storing the registered model. Implementations must tolerate
/// concurrent readers and serialize promotion writes.
pub trait RegistryBackend: Send + Sync {
    /// The currently registered model, if any run ever promoted one.
    fn current(&self) -> Result<Option<RegisteredModel>, PipelineError>;

    /// Atomically replace the registered model with `candidate`.
    fn promote(&self, candidate: ModelCandidate) -> Result<RegisteredModel, PipelineError>;
}

/// JSON-file registry backend.
///
/// Readers see either the previous record or the new one, never a partial
/// write; a mutex around the read-modify-write keeps promotions from
/// interleaving. First successful write wins on races.
pub struct JsonRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

impl RegistryBackend for JsonRegistry {
    fn current(&self) -> Result<Option<RegisteredModel>, PipelineError> {
        load_json(&self.path).map_err(PipelineError::Io)
    }

    fn promote(&self, candidate: ModelCandidate) -> Result<RegisteredModel, PipelineError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PipelineError::registry_write("registry lock poisoned"))?;

        let previous: Option<RegisteredModel> = load_json(&self.path)
            .map_err(|e| PipelineError::registry_write(format!("read current: {e}")))?;
        let version = previous.as_ref().map_or(1, |m| m.version + 1);

        let registered = RegisteredModel {
            model_id: uuid::Uuid::new_v4().to_string(),
            run_id: candidate.run_id,
            version,
            model_uri: candidate.model_uri,
            metric: candidate.metric,
            schema_fingerprint: candidate.schema_fingerprint,
            promoted_at: Utc::now(),
        };

        atomic_write_json(&self.path, &registered)
            .map_err(|e| PipelineError::registry_write(format!("write: {e}")))?;

        info!(
            model_id = %registered.model_id,
            run_id = %registered.run_id,
            version = registered.version,
            metric = %registered.metric.name,
            value = registered.metric.value,
            "model promoted"
        );

        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn candidate(run: &str, value: f64) -> ModelCandidate {
        ModelCandidate {
            run_id: run.to_string(),
            model_uri: format!("models/{run}.json"),
            metric: MetricSnapshot {
                name: "accuracy".into(),
                value,
            },
            schema_fingerprint: "abc".into(),
        }
    }

    #[test]
    fn test_current_absent_before_first_promotion() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = JsonRegistry::new(dir.path().join("registry.json"));
        assert!(registry.current().unwrap().is_none());
    }

    #[test]
    fn test_promote_bumps_version_monotonically() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = JsonRegistry::new(dir.path().join("registry.json"));

        let first = registry.promote(candidate("run-1", 0.8)).unwrap();
        assert_eq!(first.version, 1);

        let second = registry.promote(candidate("run-2", 0.85)).unwrap();
        assert_eq!(second.version, 2);

        let current = registry.current().unwrap().unwrap();
        assert_eq!(current.run_id, "run-2");
        assert_eq!(current.metric.value, 0.85);
    }

    #[test]
    fn test_concurrent_promotions_never_interleave() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = Arc::new(JsonRegistry::new(dir.path().join("registry.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .promote(candidate(&format!("run-{i}"), 0.5 + i as f64 * 0.01))
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // The final record is exactly one candidate, not a mix: its run_id,
        // metric, and model_uri all belong to the same run.
        let current = registry.current().unwrap().unwrap();
        let idx: usize = current.run_id.strip_prefix("run-").unwrap().parse().unwrap();
        assert_eq!(current.metric.value, 0.5 + idx as f64 * 0.01);
        assert_eq!(current.model_uri, format!("models/run-{idx}.json"));
        assert_eq!(current.version, 8);
    }
}
