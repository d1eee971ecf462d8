// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Run Summary
// ─────────────────────────────────────────────────────────────────────
//! Aggregate statistics over a sequence of per-step metrics.

use serde::{Deserialize, Serialize};

use atlas_types::StepMetrics;

/// Whole-run aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub mean_r_total: f64,
    /// Population standard deviation of R_total.
    pub std_r_total: f64,
    pub final_r_total: f64,
    pub mean_cross_sync: f64,
    pub mean_phase_entropy: f64,
    pub mean_readiness: f64,
    pub mean_smoothness: f64,
    /// Steps whose choice score was positive.
    pub choice_steps: usize,
    /// Zero-based index into the metrics sequence of the first positive choice.
    pub first_choice: Option<usize>,
}

fn mean(values: impl Iterator<Item = f64>) -> (f64, usize) {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        (0.0, 0)
    } else {
        (sum / n as f64, n)
    }
}

impl RunSummary {
    pub fn from_metrics(metrics: &[StepMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let (mean_r, n) = mean(metrics.iter().map(|m| m.r_total));
        let var = metrics
            .iter()
            .map(|m| (m.r_total - mean_r).powi(2))
            .sum::<f64>()
            / n as f64;

        Self {
            steps: n,
            mean_r_total: mean_r,
            std_r_total: var.sqrt(),
            final_r_total: metrics.last().map_or(0.0, |m| m.r_total),
            mean_cross_sync: mean(metrics.iter().map(|m| m.cross_sync)).0,
            mean_phase_entropy: mean(metrics.iter().map(|m| m.phase_entropy)).0,
            mean_readiness: mean(metrics.iter().map(|m| m.readiness)).0,
            mean_smoothness: mean(metrics.iter().map(|m| m.smoothness)).0,
            choice_steps: metrics.iter().filter(|m| m.choice_score > 0.0).count(),
            first_choice: metrics.iter().position(|m| m.choice_score > 0.0),
        }
    }
}
