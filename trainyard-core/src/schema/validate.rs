//! Exhaustive dataset validation against a schema.
//!
//! Validation never short-circuits: a single run surfaces the complete list
//! of problems, one violation per (column, kind).

use crate::data::Dataset;
use crate::schema::spec::{ColumnConstraint, ColumnType, SchemaSpec};
use serde::{Deserialize, Serialize};

/// A single validation violation, aggregated per column and kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    MissingColumn {
        column: String,
    },
    TypeMismatch {
        column: String,
        expected: ColumnType,
        count: usize,
        first_row: usize,
    },
    NullNotAllowed {
        column: String,
        count: usize,
        first_row: usize,
    },
    OutOfRange {
        column: String,
        min: f64,
        max: f64,
        count: usize,
        first_row: usize,
    },
    UnknownCategory {
        column: String,
        values: Vec<String>,
        count: usize,
    },
    NullRatioExceeded {
        column: String,
        ratio: f64,
        tolerance: f64,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn { column } => write!(f, "column '{column}' is missing"),
            Self::TypeMismatch {
                column,
                expected,
                count,
                first_row,
            } => write!(
                f,
                "column '{column}' has {count} value(s) not of type {} (first at row {first_row})",
                expected.as_str()
            ),
            Self::NullNotAllowed {
                column,
                count,
                first_row,
            } => write!(
                f,
                "column '{column}' is non-nullable but has {count} null(s) (first at row {first_row})"
            ),
            Self::OutOfRange {
                column,
                min,
                max,
                count,
                first_row,
            } => write!(
                f,
                "column '{column}' has {count} value(s) outside [{min}, {max}] (first at row {first_row})"
            ),
            Self::UnknownCategory {
                column,
                values,
                count,
            } => write!(
                f,
                "column '{column}' has {count} value(s) outside its domain: {}",
                values.join(", ")
            ),
            Self::NullRatioExceeded {
                column,
                ratio,
                tolerance,
            } => write!(
                f,
                "column '{column}' null ratio {ratio:.3} exceeds tolerance {tolerance:.3}"
            ),
        }
    }
}

/// Outcome of validating one dataset against one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows_checked: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate a dataset against a schema.
///
/// Checks, for every declared column: presence, per-cell type conformance,
/// nullability, numeric range / categorical domain constraints, and the
/// null-value ratio against `null_ratio_tolerance`.
pub fn validate(dataset: &Dataset, spec: &SchemaSpec, null_ratio_tolerance: f64) -> ValidationReport {
    let mut violations = Vec::new();
    let rows = dataset.row_count();

    for col_spec in &spec.columns {
        let Some(idx) = dataset.column_index(&col_spec.name) else {
            violations.push(Violation::MissingColumn {
                column: col_spec.name.clone(),
            });
            continue;
        };

        let mut type_mismatches = 0usize;
        let mut first_mismatch = 0usize;
        let mut nulls = 0usize;
        let mut first_null = 0usize;
        let mut out_of_range = 0usize;
        let mut first_out_of_range = 0usize;
        let mut unknown: Vec<String> = Vec::new();
        let mut unknown_count = 0usize;

        for (row_idx, value) in dataset.column_values(idx).into_iter().enumerate() {
            if value.is_null() {
                if nulls == 0 {
                    first_null = row_idx;
                }
                nulls += 1;
                continue;
            }

            if !col_spec.dtype.matches(value) {
                if type_mismatches == 0 {
                    first_mismatch = row_idx;
                }
                type_mismatches += 1;
                continue;
            }

            match &col_spec.constraint {
                Some(ColumnConstraint::Range { min, max }) => {
                    if let Some(n) = value.as_f64() {
                        if n < *min || n > *max {
                            if out_of_range == 0 {
                                first_out_of_range = row_idx;
                            }
                            out_of_range += 1;
                        }
                    }
                }
                Some(ColumnConstraint::Domain { allowed }) => {
                    let text = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if !allowed.contains(&text) {
                        if !unknown.contains(&text) {
                            unknown.push(text);
                        }
                        unknown_count += 1;
                    }
                }
                None => {}
            }
        }

        if type_mismatches > 0 {
            violations.push(Violation::TypeMismatch {
                column: col_spec.name.clone(),
                expected: col_spec.dtype,
                count: type_mismatches,
                first_row: first_mismatch,
            });
        }
        if nulls > 0 && !col_spec.nullable {
            violations.push(Violation::NullNotAllowed {
                column: col_spec.name.clone(),
                count: nulls,
                first_row: first_null,
            });
        }
        if out_of_range > 0 {
            if let Some(ColumnConstraint::Range { min, max }) = &col_spec.constraint {
                violations.push(Violation::OutOfRange {
                    column: col_spec.name.clone(),
                    min: *min,
                    max: *max,
                    count: out_of_range,
                    first_row: first_out_of_range,
                });
            }
        }
        if unknown_count > 0 {
            violations.push(Violation::UnknownCategory {
                column: col_spec.name.clone(),
                values: unknown,
                count: unknown_count,
            });
        }
        if rows > 0 {
            let ratio = nulls as f64 / rows as f64;
            if ratio > null_ratio_tolerance {
                violations.push(Violation::NullRatioExceeded {
                    column: col_spec.name.clone(),
                    ratio,
                    tolerance: null_ratio_tolerance,
                });
            }
        }
    }

    ValidationReport {
        rows_checked: rows,
        violations,
    }
}
