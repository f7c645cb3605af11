//! Classifier training and evaluation metrics.

pub mod logistic;
pub mod metrics;

pub use logistic::{LogisticModel, TrainParams, train};
pub use metrics::{ClassificationMetrics, GateMetric};
