//! Logistic-regression classifier trained by batch gradient descent.
//!
//! The fit is deterministic for a given feature matrix and hyperparameters:
//! weights start at zero and full-batch gradients need no sampling, so run
//! reproducibility depends only on the seeded split upstream.

use crate::error::PipelineError;
use crate::model::metrics::ClassificationMetrics;
use crate::transform::FeatureMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainParams {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// L2 regularization strength.
    #[serde(default)]
    pub l2: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            l2: 0.0,
        }
    }
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_epochs() -> usize {
    200
}

/// A fitted binary classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub feature_names: Vec<String>,
    /// Target class labels; prediction 1 means `classes[1]`.
    pub classes: Vec<String>,
}

impl LogisticModel {
    /// Probability of the positive class for one feature row.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) >= 0.5)
    }

    /// Predicted labels for every row of a matrix.
    pub fn predict_all(&self, matrix: &FeatureMatrix) -> Vec<u8> {
        matrix.rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Metrics of this model on a labeled matrix.
    pub fn evaluate(&self, matrix: &FeatureMatrix) -> ClassificationMetrics {
        ClassificationMetrics::from_predictions(&self.predict_all(matrix), &matrix.labels)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Fit a logistic-regression model on a training matrix.
///
/// Fails with a `Training` error when the loss diverges (non-finite) or the
/// matrix is degenerate.
pub fn train(
    matrix: &FeatureMatrix,
    classes: &[String],
    params: &TrainParams,
) -> Result<(LogisticModel, Vec<f64>), PipelineError> {
    let n = matrix.row_count();
    let d = matrix.feature_count();
    if n == 0 || d == 0 {
        return Err(PipelineError::training(format!(
            "degenerate training matrix: {n} rows x {d} features"
        )));
    }
    if params.learning_rate <= 0.0 || params.epochs == 0 {
        return Err(PipelineError::training(format!(
            "invalid hyperparameters: learning_rate={}, epochs={}",
            params.learning_rate, params.epochs
        )));
    }

    let mut weights = vec![0.0f64; d];
    let mut bias = 0.0f64;
    let mut loss_history = Vec::with_capacity(params.epochs);

    for epoch in 0..params.epochs {
        let mut grad_w = vec![0.0f64; d];
        let mut grad_b = 0.0f64;
        let mut loss = 0.0f64;

        for (row, &label) in matrix.rows.iter().zip(&matrix.labels) {
            let y = f64::from(label);
            let z: f64 =
                weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + bias;
            let p = sigmoid(z);
            let err = p - y;
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += err * x;
            }
            grad_b += err;
            // Clamped log-loss keeps the history finite for saturated
            // probabilities; divergence is detected via the weights below.
            let p_clamped = p.clamp(1e-12, 1.0 - 1e-12);
            loss -= y * p_clamped.ln() + (1.0 - y) * (1.0 - p_clamped).ln();
        }

        let scale = 1.0 / n as f64;
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= params.learning_rate * (g * scale + params.l2 * *w);
        }
        bias -= params.learning_rate * grad_b * scale;

        let l2_penalty =
            0.5 * params.l2 * weights.iter().map(|w| w * w).sum::<f64>();
        let epoch_loss = loss * scale + l2_penalty;
        loss_history.push(epoch_loss);

        if !epoch_loss.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(PipelineError::training(format!(
                "loss diverged at epoch {epoch}"
            )));
        }
        if epoch % 50 == 0 {
            debug!(epoch, loss = epoch_loss, "training progress");
        }
    }

    Ok((
        LogisticModel {
            weights,
            bias,
            feature_names: matrix.feature_names.clone(),
            classes: classes.to_vec(),
        },
        loss_history,
    ))
}
