// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Coupling Schedules
// ─────────────────────────────────────────────────────────────────────
//! Time-varying intra-layer coupling K_l(t).
//!
//! A schedule is owned by the caller and sampled before each step, the
//! same way a `PhaseDriver` is. The field keeps `FieldConfig::intra_k` as
//! the base and only the live `OscillatorLayer::k` changes.
//!
//!   breath:        K(t) = (1 − e(t))·K_min + e(t)·K_max
//!   e(t), inhale:  ease(t_mod / T_in)
//!   e(t), exhale:  1 − ease((t_mod − T_in) / (T − T_in))
//!   ease(x)      = ½ − ½·cos(π·clamp(x, 0, 1))

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Floor on the inhale and exhale durations.
const MIN_SPAN: f64 = 1e-9;

/// Source of K_l for the next step.
pub trait CouplingSchedule {
    /// Coupling for `layer` on the step taken from `step` completed steps
    /// at time `t`; `base_k` is the configured K_l.
    fn k_at(&self, layer: usize, step: u64, t: f64, base_k: f64) -> f64;
}

impl<F: Fn(usize, u64, f64, f64) -> f64> CouplingSchedule for F {
    fn k_at(&self, layer: usize, step: u64, t: f64, base_k: f64) -> f64 {
        self(layer, step, t, base_k)
    }
}

/// Smooth 0 → 1 ramp on [0, 1], flat outside.
#[inline]
pub fn cosine_ease(x: f64) -> f64 {
    0.5 - 0.5 * (PI * x.clamp(0.0, 1.0)).cos()
}

/// Breath envelope in [0, 1]: eased rise over the inhale share of the
/// period, eased fall over the rest.
pub fn breath_envelope(t: f64, period: f64, inhale_ratio: f64) -> f64 {
    let inhale = inhale_ratio.max(MIN_SPAN) * period;
    let t_mod = t.rem_euclid(period);
    if t_mod <= inhale {
        cosine_ease(t_mod / inhale)
    } else {
        1.0 - cosine_ease((t_mod - inhale) / (period - inhale).max(MIN_SPAN))
    }
}

fn applies(layers: &[usize], layer: usize) -> bool {
    layers.is_empty() || layers.contains(&layer)
}

/// Coupling that breathes between `k_min` and `k_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathSchedule {
    pub k_min: f64,
    pub k_max: f64,
    /// Breath period in simulation time units.
    pub period: f64,
    /// Fraction of the period spent rising.
    pub inhale_ratio: f64,
    /// Layers that breathe; empty means all.
    pub layers: Vec<usize>,
}

impl Default for BreathSchedule {
    fn default() -> Self {
        Self {
            k_min: 0.2,
            k_max: 1.2,
            period: 10.0,
            inhale_ratio: 0.4,
            layers: Vec::new(),
        }
    }
}

impl BreathSchedule {
    pub fn envelope(&self, t: f64) -> f64 {
        breath_envelope(t, self.period, self.inhale_ratio)
    }
}

impl CouplingSchedule for BreathSchedule {
    fn k_at(&self, layer: usize, _step: u64, t: f64, base_k: f64) -> f64 {
        if !applies(&self.layers, layer) {
            return base_k;
        }
        let e = self.envelope(t);
        (1.0 - e) * self.k_min + e * self.k_max
    }
}

/// Coupling override over a window of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    /// First step (completed-step count) the override applies to.
    pub start_step: u64,
    /// One past the last step of the window.
    pub end_step: u64,
    /// Layers affected; empty means all.
    #[serde(default)]
    pub layers: Vec<usize>,
    pub new_k: f64,
    /// Keep the override after `end_step` instead of reverting to the base.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

impl Intervention {
    fn active(&self, layer: usize, step: u64) -> bool {
        if !applies(&self.layers, layer) || step < self.start_step {
            return false;
        }
        step < self.end_step || self.persist
    }
}

/// Ordered list of coupling interventions.
///
/// When several are active the one that started last wins; ties go to the
/// later entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionSchedule {
    pub interventions: Vec<Intervention>,
}

impl InterventionSchedule {
    pub fn new(interventions: Vec<Intervention>) -> Self {
        Self { interventions }
    }
}

impl CouplingSchedule for InterventionSchedule {
    fn k_at(&self, layer: usize, step: u64, _t: f64, base_k: f64) -> f64 {
        self.interventions
            .iter()
            .filter(|iv| iv.active(layer, step))
            .max_by_key(|iv| iv.start_step)
            .map_or(base_k, |iv| iv.new_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_ease_endpoints() {
        assert_eq!(cosine_ease(-1.0), 0.0);
        assert!((cosine_ease(0.5) - 0.5).abs() < 1e-12);
        assert!((cosine_ease(1.0) - 1.0).abs() < 1e-12);
        assert!((cosine_ease(7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_breath_envelope_shape() {
        // Period 10, inhale 4: peak at t = 4, trough at 0 and 10.
        assert!(breath_envelope(0.0, 10.0, 0.4).abs() < 1e-12);
        assert!((breath_envelope(2.0, 10.0, 0.4) - 0.5).abs() < 1e-12);
        assert!((breath_envelope(4.0, 10.0, 0.4) - 1.0).abs() < 1e-12);
        assert!((breath_envelope(7.0, 10.0, 0.4) - 0.5).abs() < 1e-12);
        assert!((breath_envelope(14.0, 10.0, 0.4) - 1.0).abs() < 1e-12);
        for k in 0..200 {
            let e = breath_envelope(k as f64 * 0.13, 10.0, 0.4);
            assert!((0.0..=1.0).contains(&e), "e={e}");
        }
    }

    #[test]
    fn test_breath_schedule_interpolates_k() {
        let s = BreathSchedule {
            k_min: 0.2,
            k_max: 1.0,
            layers: vec![1],
            ..BreathSchedule::default()
        };
        assert!((s.k_at(1, 0, 0.0, 9.0) - 0.2).abs() < 1e-12);
        assert!((s.k_at(1, 0, 4.0, 9.0) - 1.0).abs() < 1e-12);
        assert!((s.k_at(1, 0, 2.0, 9.0) - 0.6).abs() < 1e-12);
        // Layer 0 is not listed: base K.
        assert_eq!(s.k_at(0, 0, 4.0, 9.0), 9.0);
    }

    #[test]
    fn test_intervention_window_and_persistence() {
        let schedule = InterventionSchedule::new(vec![
            Intervention {
                start_step: 10,
                end_step: 20,
                layers: vec![0],
                new_k: 2.0,
                persist: true,
            },
            Intervention {
                start_step: 30,
                end_step: 40,
                layers: Vec::new(),
                new_k: 0.1,
                persist: false,
            },
        ]);
        let k = |layer, step| schedule.k_at(layer, step, 0.0, 0.5);
        assert_eq!(k(0, 9), 0.5);
        assert_eq!(k(0, 10), 2.0);
        assert_eq!(k(0, 25), 2.0, "persisting override sticks");
        assert_eq!(k(1, 15), 0.5, "layer 1 untouched");
        assert_eq!(k(0, 35), 0.1, "later start wins");
        assert_eq!(k(1, 35), 0.1);
        assert_eq!(k(1, 40), 0.5, "non-persisting override reverts");
        assert_eq!(k(0, 40), 2.0);
    }

    #[test]
    fn test_intervention_serde_defaults() {
        let iv: Intervention =
            serde_json::from_str(r#"{"start_step": 5, "end_step": 8, "new_k": 1.5}"#).unwrap();
        assert!(iv.persist);
        assert!(iv.layers.is_empty());
    }

    #[test]
    fn test_closure_schedule() {
        let double = |_l: usize, _s: u64, _t: f64, k: f64| 2.0 * k;
        assert_eq!(double.k_at(0, 0, 0.0, 0.3), 0.6);
    }
}
