//! Declarative schema definition for incoming datasets.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    /// Whether a JSON value conforms to this type. Integer-valued numbers
    /// are accepted where floats are declared.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::Integer => value.as_i64().is_some(),
            Self::Float => value.as_f64().is_some(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Value constraint on a column beyond its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnConstraint {
    /// Inclusive numeric range.
    Range { min: f64, max: f64 },
    /// Closed categorical domain.
    Domain { allowed: Vec<String> },
}

/// Schema for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ColumnConstraint>,
}

/// Declarative description of the expected dataset shape.
///
/// Loaded once at pipeline start and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub columns: Vec<ColumnSpec>,
}

impl SchemaSpec {
    /// Load a schema from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("schema file {}: {e}", path.display()))
        })?;
        let spec: SchemaSpec = serde_json::from_str(&content).map_err(|e| {
            PipelineError::config(format!("schema file {}: {e}", path.display()))
        })?;
        if spec.columns.is_empty() {
            return Err(PipelineError::config(format!(
                "schema file {}: no columns declared",
                path.display()
            )));
        }
        Ok(spec)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Stable SHA-256 fingerprint over the serialized schema.
    ///
    /// Stamped into dataset artifacts and the registered model so schema
    /// drift between runs is detectable.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
