// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Metrics Extractor
// ─────────────────────────────────────────────────────────────────────
//! Scalar observables of a multi-layer phase snapshot.
//!
//!   r_total    = |(1/LN) Σ_l Σ_i e^{iθ_l,i}|
//!   cross_sync = |(1/L) Σ_l e^{iψ_l}|
//!   drift      = (1/LN) Σ |angle(θ_l,i(t) − θ_l,i(t−1))|
//!   readiness  = r_total + cross_sync − drift
//!   smoothness = ((1/LN) Σ cos(θ_l,i(t) − θ_l,i(t−1)) + 1) / 2
//!
//! The extractor keeps only the previous snapshot needed for drift and
//! smoothness; every other value is computed fresh.

use std::f64::consts::TAU;

use atlas_physics::{angle_diff, order_parameter, phasor_sums, OrderParameter};
use atlas_types::{clamp_score, MetricsConfig, RunFlags, StepMetrics};

/// Second-order order parameter: coherence of the layer mean phases.
///
/// Empty input gives 0; a single layer gives 1.
pub fn cross_sync(layers: &[OrderParameter]) -> f64 {
    if layers.is_empty() {
        return 0.0;
    }
    let (c, s, n) = phasor_sums(layers.iter().map(|op| op.psi));
    let n = n as f64;
    OrderParameter::from_mean(c / n, s / n).r
}

/// Heuristic readiness: coherence + cross_sync − drift.
///
/// With `clamp` the result is bounded to [0, 1].
pub fn readiness(coherence: f64, cross: f64, drift: f64, clamp: bool) -> f64 {
    let raw = coherence + cross - drift;
    if clamp {
        clamp_score(raw, 0.0, 1.0)
    } else {
        raw
    }
}

/// Binary choice gate. Closed unless both flags are set.
pub fn choice_score(
    offer_two_paths: bool,
    consent_to_log: bool,
    readiness: f64,
    threshold: f64,
) -> f64 {
    if !(offer_two_paths && consent_to_log) {
        return 0.0;
    }
    if readiness >= threshold {
        1.0
    } else {
        0.0
    }
}

/// Shannon entropy of a `bins`-bin histogram over [0, 2π), normalised by ln(bins).
///
/// 0 for a single occupied bin, 1 for a uniform spread. Empty input gives 0.
pub fn phase_entropy<I: IntoIterator<Item = f64>>(phases: I, bins: usize) -> f64 {
    let bins = bins.max(2);
    let mut hist = vec![0usize; bins];
    let mut total = 0usize;
    for th in phases {
        let x = th.rem_euclid(TAU);
        let b = ((x / TAU) * bins as f64) as usize;
        hist[b.min(bins - 1)] += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let h: f64 = hist
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum();
    (h / (bins as f64).ln()).clamp(0.0, 1.0)
}

/// Lag-1 comparison of one snapshot against the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Lag1 {
    drift: f64,
    smoothness: f64,
}

impl Lag1 {
    const FIRST: Lag1 = Lag1 {
        drift: 0.0,
        smoothness: 1.0,
    };
}

/// Stateful extractor: owns the previous snapshot for drift and smoothness.
#[derive(Debug, Clone)]
pub struct MetricsExtractor {
    cfg: MetricsConfig,
    prev: Option<Vec<Vec<f64>>>,
}

impl MetricsExtractor {
    pub fn new(cfg: MetricsConfig) -> Self {
        Self { cfg, prev: None }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.cfg
    }

    /// Forget the retained snapshot; the next drift is 0 and smoothness 1.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Mean circular |Δθ| against the retained snapshot, then retain `current`.
    ///
    /// 0 on the first call and after a shape change.
    pub fn drift<T: AsRef<[f64]>>(&mut self, current: &[T], dt: f64) -> f64 {
        self.advance(current, dt).drift
    }

    /// Lag-1 smoothness against the retained snapshot, then retain `current`.
    ///
    /// 1 when nothing moved, 0 when every node flipped by π. 1 on the first
    /// call and after a shape change.
    pub fn smoothness<T: AsRef<[f64]>>(&mut self, current: &[T]) -> f64 {
        self.advance(current, 0.0).smoothness
    }

    fn advance<T: AsRef<[f64]>>(&mut self, current: &[T], dt: f64) -> Lag1 {
        let same_shape = self.prev.as_ref().is_some_and(|prev| {
            prev.len() == current.len()
                && prev
                    .iter()
                    .zip(current)
                    .all(|(p, c)| p.len() == c.as_ref().len())
        });
        if self.prev.is_some() && !same_shape {
            log::warn!("MetricsExtractor: snapshot shape changed, drift reset");
        }

        let lag1 = match (&self.prev, same_shape) {
            (Some(prev), true) => {
                let (abs_sum, cos_sum, n) =
                    prev.iter()
                        .zip(current)
                        .fold((0.0, 0.0, 0usize), |acc, (p, c)| {
                            p.iter().zip(c.as_ref()).fold(acc, |(a_sum, c_sum, n), (&a, &b)| {
                                let d = angle_diff(b, a);
                                (a_sum + d.abs(), c_sum + d.cos(), n + 1)
                            })
                        });
                if n == 0 {
                    Lag1::FIRST
                } else {
                    let mean = abs_sum / n as f64;
                    let drift = if self.cfg.drift_per_unit_time && dt > 0.0 {
                        mean / dt
                    } else {
                        mean
                    };
                    Lag1 {
                        drift,
                        smoothness: 0.5 * (cos_sum / n as f64 + 1.0),
                    }
                }
            }
            _ => Lag1::FIRST,
        };

        match self.prev.as_mut() {
            Some(prev) if same_shape => {
                for (p, c) in prev.iter_mut().zip(current) {
                    p.copy_from_slice(c.as_ref());
                }
            }
            _ => self.prev = Some(current.iter().map(|c| c.as_ref().to_vec()).collect()),
        }
        lag1
    }

    /// Compute the full metrics bundle for one snapshot.
    pub fn extract<T: AsRef<[f64]>>(
        &mut self,
        layers: &[T],
        dt: f64,
        flags: RunFlags,
    ) -> StepMetrics {
        let per_layer: Vec<OrderParameter> =
            layers.iter().map(|l| order_parameter(l.as_ref())).collect();
        let r_layers: Vec<f64> = per_layer.iter().map(|op| op.r).collect();
        let r_mean = if r_layers.is_empty() {
            0.0
        } else {
            r_layers.iter().sum::<f64>() / r_layers.len() as f64
        };

        let pooled = || layers.iter().flat_map(|l| l.as_ref().iter().copied());
        let (c, s, n) = phasor_sums(pooled());
        let r_total = if n == 0 {
            0.0
        } else {
            OrderParameter::from_mean(c / n as f64, s / n as f64).r
        };

        let cross = cross_sync(&per_layer);
        let Lag1 { drift, smoothness } = self.advance(layers, dt);
        let ready = readiness(r_total, cross, drift, self.cfg.clamp_readiness);
        let choice = choice_score(
            flags.offer_two_paths,
            flags.consent_to_log,
            ready,
            self.cfg.choice_threshold,
        );

        StepMetrics {
            r_total,
            r_layers,
            r_mean,
            cross_sync: cross,
            drift,
            readiness: ready,
            choice_score: choice,
            phase_entropy: phase_entropy(pooled(), self.cfg.entropy_bins),
            smoothness,
        }
    }
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
