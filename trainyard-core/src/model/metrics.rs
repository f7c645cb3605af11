//! Classification metrics computed on the held-out partition.

use serde::{Deserialize, Serialize};

/// Binary classification metrics. The positive class is label 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ClassificationMetrics {
    /// Compute metrics from predicted and actual labels.
    ///
    /// Precision and recall degenerate to 0 when their denominator is empty
    /// (no positive predictions / no positive labels).
    pub fn from_predictions(predicted: &[u8], actual: &[u8]) -> Self {
        debug_assert_eq!(predicted.len(), actual.len());
        let n = actual.len();
        if n == 0 {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1_score: 0.0,
                support: 0,
            };
        }

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fn_ = 0usize;
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (1, 1) => tp += 1,
                (1, 0) => fp += 1,
                (0, 0) => tn += 1,
                _ => fn_ += 1,
            }
        }

        let accuracy = (tp + tn) as f64 / n as f64;
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            support: n,
        }
    }
}

/// Metric the evaluation gate compares on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMetric {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl GateMetric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::F1 => "f1",
        }
    }

    pub fn value_of(&self, metrics: &ClassificationMetrics) -> f64 {
        match self {
            Self::Accuracy => metrics.accuracy,
            Self::Precision => metrics.precision,
            Self::Recall => metrics.recall,
            Self::F1 => metrics.f1_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_from_known_confusion() {
        // tp=2 fp=1 tn=1 fn=1
        let predicted = [1, 1, 1, 0, 0];
        let actual = [1, 1, 0, 0, 1];
        let m = ClassificationMetrics::from_predictions(&predicted, &actual);
        assert!((m.accuracy - 0.6).abs() < 1e-9);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((m.f1_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.support, 5);
    }

    #[test]
    fn test_metrics_degenerate_cases() {
        let m = ClassificationMetrics::from_predictions(&[0, 0], &[0, 0]);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }

    #[test]
    fn test_gate_metric_lookup() {
        let m = ClassificationMetrics {
            accuracy: 0.9,
            precision: 0.8,
            recall: 0.7,
            f1_score: 0.75,
            support: 10,
        };
        assert_eq!(GateMetric::Accuracy.value_of(&m), 0.9);
        assert_eq!(GateMetric::F1.value_of(&m), 0.75);
        assert_eq!(GateMetric::Recall.name(), "recall");
    }
}
