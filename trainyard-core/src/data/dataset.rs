//! In-memory tabular dataset passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tabular batch of records: named columns over rows of JSON values.
///
/// Cells are `serde_json::Value` so a single representation covers every
/// source format; typed interpretation happens against the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column across all rows. Missing cells read as null.
    pub fn column_values(&self, index: usize) -> Vec<&serde_json::Value> {
        self.rows
            .iter()
            .map(|row| row.get(index).unwrap_or(&serde_json::Value::Null))
            .collect()
    }

    /// Fraction of null (or missing) cells per column.
    pub fn null_ratios(&self) -> BTreeMap<String, f64> {
        let mut ratios = BTreeMap::new();
        if self.rows.is_empty() {
            for col in &self.columns {
                ratios.insert(col.clone(), 0.0);
            }
            return ratios;
        }
        for (i, col) in self.columns.iter().enumerate() {
            let nulls = self
                .rows
                .iter()
                .filter(|row| row.get(i).is_none_or(|v| v.is_null()))
                .count();
            ratios.insert(col.clone(), nulls as f64 / self.rows.len() as f64);
        }
        ratios
    }
}
