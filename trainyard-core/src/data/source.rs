//! Data source abstraction — the external collaborator the ingest stage
//! pulls raw records from.

use crate::data::dataset::Dataset;
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Declarative data source descriptor carried in the pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceConfig {
    Csv {
        path: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    Jsonl {
        path: PathBuf,
    },
}

fn default_delimiter() -> char {
    ','
}

impl DataSourceConfig {
    /// Construct the source implementation described by this config.
    pub fn build(&self) -> Box<dyn DataSource> {
        match self {
            Self::Csv { path, delimiter } => Box::new(CsvSource {
                path: path.clone(),
                delimiter: *delimiter,
            }),
            Self::Jsonl { path } => Box::new(JsonlSource { path: path.clone() }),
        }
    }
}

/// Trait for fetching raw records from an external store.
///
/// Implementations fail with `SourceUnavailable` when the collaborator
/// cannot be reached; an empty result is the ingest stage's concern.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch all records from this source.
    async fn fetch(&self) -> Result<Dataset, PipelineError>;

    /// Human-readable location, for logging and artifact metadata.
    fn location(&self) -> String;
}

/// Parse a raw text cell into a typed JSON value.
///
/// Empty cells become null; integers, floats, and booleans are recognized;
/// everything else stays a string.
fn parse_cell(raw: &str) -> serde_json::Value {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return serde_json::Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return serde_json::Value::Number(i.into());
    }
    if let Ok(f) = s.parse::<f64>() {
        return serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(s.to_string()));
    }
    if s == "true" || s == "false" {
        return serde_json::Value::Bool(s == "true");
    }
    serde_json::Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// CsvSource
// ---------------------------------------------------------------------------

/// CSV file data source.
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

#[async_trait]
impl DataSource for CsvSource {
    async fn fetch(&self) -> Result<Dataset, PipelineError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::source_unavailable(format!("{}: {e}", self.path.display()))
        })?;
        let mut lines = content.lines();

        let columns: Vec<String> = lines
            .next()
            .ok_or_else(|| {
                PipelineError::source_unavailable(format!(
                    "{}: missing CSV header",
                    self.path.display()
                ))
            })?
            .split(self.delimiter)
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<serde_json::Value> =
                line.split(self.delimiter).map(parse_cell).collect();
            rows.push(row);
        }

        Ok(Dataset::new(columns, rows))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// JsonlSource
// ---------------------------------------------------------------------------

/// Newline-delimited JSON data source. Column order follows the first record.
pub struct JsonlSource {
    pub path: PathBuf,
}

#[async_trait]
impl DataSource for JsonlSource {
    async fn fetch(&self) -> Result<Dataset, PipelineError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::source_unavailable(format!("{}: {e}", self.path.display()))
        })?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: serde_json::Map<String, serde_json::Value> = serde_json::from_str(line)
                .map_err(|e| {
                    PipelineError::source_unavailable(format!(
                        "{}: malformed JSON on line {}: {e}",
                        self.path.display(),
                        line_no + 1
                    ))
                })?;
            if columns.is_empty() {
                columns = record.keys().cloned().collect();
            }
            let row: Vec<serde_json::Value> = columns
                .iter()
                .map(|col| record.get(col).cloned().unwrap_or(serde_json::Value::Null))
                .collect();
            rows.push(row);
        }

        Ok(Dataset::new(columns, rows))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// InMemorySource
// ---------------------------------------------------------------------------

/// Source backed by an already materialized dataset. Used by tests and by
/// callers that assemble records programmatically.
pub struct InMemorySource {
    pub dataset: Dataset,
    pub name: String,
}

impl InMemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            name: "memory".to_string(),
        }
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn fetch(&self) -> Result<Dataset, PipelineError> {
        Ok(self.dataset.clone())
    }

    fn location(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_csv_fetch_typed_cells() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,age,score,active").unwrap();
        writeln!(f, "Alice,30,0.5,true").unwrap();
        writeln!(f, "Bob,,1.25,false").unwrap();

        let source = CsvSource {
            path,
            delimiter: ',',
        };
        let ds = source.fetch().await.unwrap();
        assert_eq!(ds.columns, vec!["name", "age", "score", "active"]);
        assert_eq!(ds.rows[0][1], serde_json::json!(30));
        assert_eq!(ds.rows[0][2], serde_json::json!(0.5));
        assert_eq!(ds.rows[0][3], serde_json::json!(true));
        assert!(ds.rows[1][1].is_null());
    }

    #[tokio::test]
    async fn test_csv_missing_file_is_source_unavailable() {
        let source = CsvSource {
            path: PathBuf::from("/nonexistent/data.csv"),
            delimiter: ',',
        };
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_jsonl_fetch() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"name": "Alice", "age": 30}}"#).unwrap();
        writeln!(f, r#"{{"name": "Bob", "age": 25}}"#).unwrap();

        let source = JsonlSource { path };
        let ds = source.fetch().await.unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.columns.len(), 2);
        let age_idx = ds.column_index("age").unwrap();
        assert_eq!(ds.rows[1][age_idx], serde_json::json!(25));
    }

    #[tokio::test]
    async fn test_jsonl_malformed_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let source = JsonlSource { path };
        assert!(matches!(
            source.fetch().await.unwrap_err(),
            PipelineError::SourceUnavailable(_)
        ));
    }
}
