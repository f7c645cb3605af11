//! Evaluation gate — decides whether a candidate model replaces the
//! currently registered one.
//!
//! Every decision logs its full inputs for audit, regardless of where the
//! audit trail is ultimately persisted.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Comparison direction for the gated metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricOrientation {
    HigherIsBetter,
    LowerIsBetter,
}

/// Outcome of one gate decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub promote: bool,
    pub candidate: f64,
    pub baseline: Option<f64>,
    /// Oriented improvement over the baseline; absent on a first-ever run.
    pub delta: Option<f64>,
    pub threshold: f64,
    pub orientation: MetricOrientation,
}

/// Decide promotion for a candidate metric against an optional baseline.
///
/// With no baseline (first-ever run) the candidate promotes unconditionally.
/// Otherwise the oriented improvement must meet the non-negative `threshold`
/// margin, which keeps noise-level metric differences from oscillating the
/// registered model.
pub fn decide(
    candidate: f64,
    baseline: Option<f64>,
    threshold: f64,
    orientation: MetricOrientation,
) -> GateDecision {
    let decision = match baseline {
        None => GateDecision {
            promote: true,
            candidate,
            baseline: None,
            delta: None,
            threshold,
            orientation,
        },
        Some(base) => {
            let delta = match orientation {
                MetricOrientation::HigherIsBetter => candidate - base,
                MetricOrientation::LowerIsBetter => base - candidate,
            };
            GateDecision {
                promote: delta >= threshold,
                candidate,
                baseline: Some(base),
                delta: Some(delta),
                threshold,
                orientation,
            }
        }
    };

    info!(
        candidate = decision.candidate,
        baseline = ?decision.baseline,
        delta = ?decision.delta,
        threshold = decision.threshold,
        orientation = ?decision.orientation,
        promote = decision.promote,
        "evaluation gate decision"
    );

    decision
}

/// Full evaluation record emitted as a pipeline artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metric: String,
    pub decision: GateDecision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote_when_margin_met() {
        let d = decide(0.83, Some(0.80), 0.02, MetricOrientation::HigherIsBetter);
        assert!(d.promote);
        assert!((d.delta.unwrap() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_reject_within_noise_margin() {
        let d = decide(0.81, Some(0.80), 0.02, MetricOrientation::HigherIsBetter);
        assert!(!d.promote);
    }

    #[test]
    fn test_no_baseline_always_promotes() {
        let d = decide(0.10, None, 0.02, MetricOrientation::HigherIsBetter);
        assert!(d.promote);
        assert!(d.delta.is_none());
    }

    #[test]
    fn test_exact_threshold_promotes() {
        let d = decide(0.82, Some(0.80), 0.02, MetricOrientation::HigherIsBetter);
        assert!(d.promote);
    }

    #[test]
    fn test_lower_is_better_orientation() {
        // Loss-style metric: an improvement is a decrease.
        let d = decide(0.30, Some(0.40), 0.05, MetricOrientation::LowerIsBetter);
        assert!(d.promote);
        assert!((d.delta.unwrap() - 0.10).abs() < 1e-9);

        let d = decide(0.45, Some(0.40), 0.05, MetricOrientation::LowerIsBetter);
        assert!(!d.promote);
    }

    #[test]
    fn test_monotonic_in_candidate() {
        // Raising the candidate with baseline and threshold fixed never
        // flips promote back to reject.
        let mut last_promoted = false;
        for i in 0..100 {
            let candidate = 0.5 + i as f64 * 0.005;
            let d = decide(candidate, Some(0.80), 0.02, MetricOrientation::HigherIsBetter);
            if last_promoted {
                assert!(d.promote, "candidate {candidate} flipped back to reject");
            }
            last_promoted = d.promote;
        }
        assert!(last_promoted);
    }
}
