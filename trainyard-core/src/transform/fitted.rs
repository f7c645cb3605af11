//! Fitted feature transform — standardization and one-hot encoding.
//!
//! Parameters are a function of the training partition only. The fitted
//! object is persisted next to the transformed datasets so training and any
//! later inference share identical preprocessing.

use crate::data::Dataset;
use crate::error::PipelineError;
use crate::schema::{ColumnType, SchemaSpec};
use serde::{Deserialize, Serialize};

/// Encoder for one input column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnEncoder {
    /// Z-score standardization. Nulls are imputed with the training mean.
    Standardize {
        column: String,
        mean: f64,
        std_dev: f64,
    },
    /// One-hot over the training vocabulary. Nulls encode as all zeros.
    OneHot {
        column: String,
        vocabulary: Vec<String>,
    },
}

impl ColumnEncoder {
    pub fn column(&self) -> &str {
        match self {
            Self::Standardize { column, .. } | Self::OneHot { column, .. } => column,
        }
    }
}

/// Dense numeric matrix produced by applying a fitted transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl FeatureMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// A feature transform fitted on the training partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedTransform {
    pub encoders: Vec<ColumnEncoder>,
    pub feature_names: Vec<String>,
    pub target_column: String,
    /// Target class labels; index in this list is the encoded label.
    pub classes: Vec<String>,
}

impl FittedTransform {
    /// Fit encoders on the training partition.
    ///
    /// Numeric columns (integer/float) get standardization parameters;
    /// string/boolean columns get a sorted one-hot vocabulary. The target
    /// column is encoded separately and must carry exactly two classes.
    pub fn fit(
        train: &Dataset,
        spec: &SchemaSpec,
        target_column: &str,
    ) -> Result<Self, PipelineError> {
        if spec.column(target_column).is_none() {
            return Err(PipelineError::transformation(format!(
                "target column '{target_column}' is not declared in the schema"
            )));
        }

        let mut encoders = Vec::new();
        let mut feature_names = Vec::new();

        for col_spec in &spec.columns {
            if col_spec.name == target_column {
                continue;
            }
            let idx = train.column_index(&col_spec.name).ok_or_else(|| {
                PipelineError::transformation(format!(
                    "column '{}' absent from training partition",
                    col_spec.name
                ))
            })?;
            let values = train.column_values(idx);

            match col_spec.dtype {
                ColumnType::Integer | ColumnType::Float => {
                    let nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                    if nums.is_empty() {
                        return Err(PipelineError::transformation(format!(
                            "column '{}' has no numeric values to fit on",
                            col_spec.name
                        )));
                    }
                    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
                    let variance =
                        nums.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / nums.len() as f64;
                    let std_dev = if variance > 0.0 { variance.sqrt() } else { 1.0 };
                    feature_names.push(col_spec.name.clone());
                    encoders.push(ColumnEncoder::Standardize {
                        column: col_spec.name.clone(),
                        mean,
                        std_dev,
                    });
                }
                ColumnType::String | ColumnType::Boolean => {
                    let mut vocabulary: Vec<String> = values
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(|v| categorical_text(v))
                        .collect();
                    vocabulary.sort();
                    vocabulary.dedup();
                    if vocabulary.is_empty() {
                        return Err(PipelineError::transformation(format!(
                            "column '{}' has no values to build a vocabulary from",
                            col_spec.name
                        )));
                    }
                    for entry in &vocabulary {
                        feature_names.push(format!("{}={entry}", col_spec.name));
                    }
                    encoders.push(ColumnEncoder::OneHot {
                        column: col_spec.name.clone(),
                        vocabulary,
                    });
                }
            }
        }

        if encoders.is_empty() {
            return Err(PipelineError::transformation(
                "schema declares no feature columns besides the target",
            ));
        }

        let target_idx = train.column_index(target_column).ok_or_else(|| {
            PipelineError::transformation(format!(
                "target column '{target_column}' absent from training partition"
            ))
        })?;
        let mut classes: Vec<String> = train
            .column_values(target_idx)
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| categorical_text(v))
            .collect();
        classes.sort();
        classes.dedup();
        if classes.len() != 2 {
            return Err(PipelineError::transformation(format!(
                "target column '{target_column}' has {} class(es), expected 2",
                classes.len()
            )));
        }

        Ok(Self {
            encoders,
            feature_names,
            target_column: target_column.to_string(),
            classes,
        })
    }

    /// Apply the fitted transform to a dataset.
    ///
    /// Fails on unseen categorical values and on rows whose target is null
    /// or outside the fitted classes.
    pub fn apply(&self, dataset: &Dataset) -> Result<FeatureMatrix, PipelineError> {
        let target_idx = dataset.column_index(&self.target_column).ok_or_else(|| {
            PipelineError::transformation(format!(
                "target column '{}' absent from dataset",
                self.target_column
            ))
        })?;

        let mut column_indices = Vec::with_capacity(self.encoders.len());
        for encoder in &self.encoders {
            let idx = dataset.column_index(encoder.column()).ok_or_else(|| {
                PipelineError::transformation(format!(
                    "column '{}' absent from dataset",
                    encoder.column()
                ))
            })?;
            column_indices.push(idx);
        }

        let mut rows = Vec::with_capacity(dataset.row_count());
        let mut labels = Vec::with_capacity(dataset.row_count());

        for (row_idx, row) in dataset.rows.iter().enumerate() {
            let mut features = Vec::with_capacity(self.feature_names.len());
            for (encoder, &idx) in self.encoders.iter().zip(&column_indices) {
                let value = row.get(idx).unwrap_or(&serde_json::Value::Null);
                match encoder {
                    ColumnEncoder::Standardize {
                        column,
                        mean,
                        std_dev,
                    } => {
                        let n = if value.is_null() {
                            *mean
                        } else {
                            value.as_f64().ok_or_else(|| {
                                PipelineError::transformation(format!(
                                    "column '{column}' row {row_idx}: non-numeric value {value}"
                                ))
                            })?
                        };
                        features.push((n - mean) / std_dev);
                    }
                    ColumnEncoder::OneHot { column, vocabulary } => {
                        if value.is_null() {
                            features.extend(std::iter::repeat_n(0.0, vocabulary.len()));
                        } else {
                            let text = categorical_text(value);
                            let pos = vocabulary.iter().position(|v| *v == text).ok_or_else(
                                || {
                                    PipelineError::transformation(format!(
                                        "column '{column}' row {row_idx}: unseen category '{text}'"
                                    ))
                                },
                            )?;
                            for i in 0..vocabulary.len() {
                                features.push(if i == pos { 1.0 } else { 0.0 });
                            }
                        }
                    }
                }
            }

            let target = row.get(target_idx).unwrap_or(&serde_json::Value::Null);
            if target.is_null() {
                return Err(PipelineError::transformation(format!(
                    "target column '{}' row {row_idx}: null label",
                    self.target_column
                )));
            }
            let text = categorical_text(target);
            let label = self.classes.iter().position(|c| *c == text).ok_or_else(|| {
                PipelineError::transformation(format!(
                    "target column '{}' row {row_idx}: unseen class '{text}'",
                    self.target_column
                ))
            })?;

            rows.push(features);
            labels.push(label as u8);
        }

        Ok(FeatureMatrix {
            feature_names: self.feature_names.clone(),
            rows,
            labels,
        })
    }
}

/// Canonical text form of a categorical cell.
fn categorical_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, SchemaSpec};

    fn spec() -> SchemaSpec {
        SchemaSpec {
            columns: vec![
                ColumnSpec {
                    name: "age".into(),
                    dtype: ColumnType::Integer,
                    nullable: true,
                    constraint: None,
                },
                ColumnSpec {
                    name: "city".into(),
                    dtype: ColumnType::String,
                    nullable: false,
                    constraint: None,
                },
                ColumnSpec {
                    name: "label".into(),
                    dtype: ColumnType::String,
                    nullable: false,
                    constraint: None,
                },
            ],
        }
    }

    fn train() -> Dataset {
        Dataset::new(
            vec!["age".into(), "city".into(), "label".into()],
            vec![
                vec![
                    serde_json::json!(20),
                    serde_json::json!("berlin"),
                    serde_json::json!("yes"),
                ],
                vec![
                    serde_json::json!(40),
                    serde_json::json!("paris"),
                    serde_json::json!("no"),
                ],
            ],
        )
    }

    #[test]
    fn test_fit_parameters() {
        let t = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        assert_eq!(t.classes, vec!["no", "yes"]);
        assert_eq!(
            t.feature_names,
            vec!["age", "city=berlin", "city=paris"]
        );
        match &t.encoders[0] {
            ColumnEncoder::Standardize { mean, std_dev, .. } => {
                assert!((mean - 30.0).abs() < 1e-9);
                assert!((std_dev - 10.0).abs() < 1e-9);
            }
            other => panic!("expected standardize, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_uses_training_partition_only() {
        let a = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        // A different held-out partition must not change fitted parameters;
        // refitting on the same training rows reproduces them exactly.
        let b = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        assert_eq!(
            serde_json::to_value(&a.encoders).unwrap(),
            serde_json::to_value(&b.encoders).unwrap()
        );
    }

    #[test]
    fn test_apply_standardize_round_trip() {
        let t = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        let matrix = t.apply(&train()).unwrap();
        let ColumnEncoder::Standardize { mean, std_dev, .. } = &t.encoders[0] else {
            panic!("expected standardize");
        };
        // Inverse-mapping the standardized value recovers the original.
        let recovered = matrix.rows[0][0] * std_dev + mean;
        assert!((recovered - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_unseen_category_fails() {
        let t = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        let held_out = Dataset::new(
            vec!["age".into(), "city".into(), "label".into()],
            vec![vec![
                serde_json::json!(33),
                serde_json::json!("tokyo"),
                serde_json::json!("yes"),
            ]],
        );
        let err = t.apply(&held_out).unwrap_err();
        assert!(matches!(err, PipelineError::Transformation(_)));
        assert!(err.to_string().contains("unseen category"));
    }

    #[test]
    fn test_apply_null_numeric_imputes_mean() {
        let t = FittedTransform::fit(&train(), &spec(), "label").unwrap();
        let held_out = Dataset::new(
            vec!["age".into(), "city".into(), "label".into()],
            vec![vec![
                serde_json::Value::Null,
                serde_json::json!("berlin"),
                serde_json::json!("no"),
            ]],
        );
        let matrix = t.apply(&held_out).unwrap();
        // Mean imputation standardizes to exactly zero.
        assert_eq!(matrix.rows[0][0], 0.0);
        assert_eq!(matrix.labels, vec![0]);
    }

    #[test]
    fn test_fit_requires_binary_target() {
        let mut ds = train();
        ds.rows.push(vec![
            serde_json::json!(50),
            serde_json::json!("paris"),
            serde_json::json!("maybe"),
        ]);
        assert!(FittedTransform::fit(&ds, &spec(), "label").is_err());
    }
}
