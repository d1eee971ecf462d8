// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Metrics and Record Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::config::RunFlags;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Metrics bundle computed fresh from one phase snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Coherence of every node of every layer pooled together.
    pub r_total: f64,
    /// Per-layer coherence R_l.
    pub r_layers: Vec<f64>,
    /// Mean of `r_layers`.
    pub r_mean: f64,
    /// Second-order order parameter over layer mean phases.
    pub cross_sync: f64,
    pub drift: f64,
    /// Heuristic: r_total + cross_sync − drift. Not a probability.
    pub readiness: f64,
    pub choice_score: f64,
    /// Normalised Shannon entropy of the pooled phase histogram.
    pub phase_entropy: f64,
    /// Lag-1 smoothness (mean cos Δθ + 1) / 2 against the previous step.
    pub smoothness: f64,
}

/// One interchange row for an external logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u64,
    pub t: f64,
    #[serde(rename = "R_total")]
    pub r_total: f64,
    #[serde(rename = "R_mean")]
    pub r_mean: f64,
    pub cross_sync: f64,
    pub drift: f64,
    pub ready: f64,
    pub choice_score: f64,
    pub offer_two_paths: bool,
    pub consent_to_log: bool,
}

impl StepRecord {
    /// Column order of [`StepRecord::to_row`].
    pub const HEADER: [&'static str; 10] = [
        "step",
        "t",
        "R_total",
        "R_mean",
        "cross_sync",
        "drift",
        "ready",
        "choice_score",
        "offer_two_paths",
        "consent_to_log",
    ];

    pub fn new(step: u64, t: f64, metrics: &StepMetrics, flags: RunFlags) -> Self {
        Self {
            step,
            t,
            r_total: metrics.r_total,
            r_mean: metrics.r_mean,
            cross_sync: metrics.cross_sync,
            drift: metrics.drift,
            ready: metrics.readiness,
            choice_score: metrics.choice_score,
            offer_two_paths: flags.offer_two_paths,
            consent_to_log: flags.consent_to_log,
        }
    }

    /// Comma-joined header line.
    pub fn header_line() -> String {
        Self::HEADER.join(",")
    }

    /// Comma-joined row; booleans are written as 0/1.
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.step,
            self.t,
            self.r_total,
            self.r_mean,
            self.cross_sync,
            self.drift,
            self.ready,
            self.choice_score,
            u8::from(self.offer_two_paths),
            u8::from(self.consent_to_log),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_neg_inf() {
        assert_eq!(clamp_score(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_normal() {
        assert_eq!(clamp_score(0.75, 0.0, 1.0), 0.75);
        assert_eq!(clamp_score(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp_score(-0.3, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_record_copies_metrics_and_flags() {
        let metrics = StepMetrics {
            r_total: 0.5,
            r_layers: vec![0.4, 0.6],
            r_mean: 0.5,
            cross_sync: 0.6,
            drift: 0.2,
            readiness: 0.9,
            choice_score: 1.0,
            phase_entropy: 0.3,
            smoothness: 0.99,
        };
        let flags = RunFlags {
            offer_two_paths: true,
            consent_to_log: false,
        };
        let rec = StepRecord::new(3, 0.03, &metrics, flags);
        assert_eq!(rec.step, 3);
        assert_eq!(rec.ready, 0.9);
        assert!(rec.offer_two_paths);
        assert!(!rec.consent_to_log);
    }

    #[test]
    fn test_header_and_row_align() {
        let rec = StepRecord::new(
            1,
            0.01,
            &StepMetrics {
                r_total: 0.55,
                r_mean: 0.52,
                cross_sync: 0.62,
                drift: 0.18,
                readiness: 0.7,
                choice_score: 1.0,
                ..Default::default()
            },
            RunFlags::default(),
        );
        assert_eq!(
            StepRecord::header_line(),
            "step,t,R_total,R_mean,cross_sync,drift,ready,choice_score,offer_two_paths,consent_to_log"
        );
        assert_eq!(rec.to_row(), "1,0.01,0.55,0.52,0.62,0.18,0.7,1,1,1");
        assert_eq!(
            rec.to_row().split(',').count(),
            StepRecord::HEADER.len()
        );
    }

    #[test]
    fn test_record_serializes_with_logger_column_names() {
        let rec = StepRecord::new(0, 0.0, &StepMetrics::default(), RunFlags::default());
        let json = serde_json::to_value(&rec).unwrap();
        for key in StepRecord::HEADER {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
