// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Phase Arithmetic
// ─────────────────────────────────────────────────────────────────────
//! Phase wrapping and the Kuramoto order parameter
//!
//!   Z = R · e^{iψ} = (1/N) Σ_j e^{iθ_j}
//!
//! Every phase the kernel reports lies in (−π, π].

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Wrap a real angle into (−π, π]. NaN stays NaN.
#[inline]
pub fn wrap_phase(x: f64) -> f64 {
    let y = (x + PI).rem_euclid(TAU) - PI;
    if y <= -PI {
        y + TAU
    } else {
        y
    }
}

/// Signed difference a − b wrapped into (−π, π].
#[inline]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    wrap_phase(a - b)
}

/// Complex order parameter in polar form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderParameter {
    /// Coherence magnitude R ∈ [0, 1].
    pub r: f64,
    /// Mean phase ψ ∈ (−π, π]; 0 when the mean vector vanishes.
    pub psi: f64,
}

impl OrderParameter {
    /// Build from a (mean cos, mean sin) pair.
    pub fn from_mean(cos_mean: f64, sin_mean: f64) -> Self {
        let r = cos_mean.hypot(sin_mean);
        if r == 0.0 {
            return Self { r: 0.0, psi: 0.0 };
        }
        // NaN must survive so the finiteness checks downstream see it.
        Self {
            r: if r > 1.0 { 1.0 } else { r },
            psi: wrap_phase(sin_mean.atan2(cos_mean)),
        }
    }

    /// Im(Z · e^{−iθ}) = R · sin(ψ − θ): the mean-field pull on phase θ.
    #[inline]
    pub fn pull_on(&self, theta: f64) -> f64 {
        self.r * (self.psi - theta).sin()
    }
}

/// Σ cos θ and Σ sin θ over an iterator of phases.
#[inline]
pub fn phasor_sums<I: IntoIterator<Item = f64>>(phases: I) -> (f64, f64, usize) {
    phases
        .into_iter()
        .fold((0.0, 0.0, 0usize), |(c, s, n), th| (c + th.cos(), s + th.sin(), n + 1))
}

/// Kuramoto order parameter of a phase sequence.
///
/// Empty input yields (0, 0) rather than dividing by zero.
pub fn order_parameter(theta: &[f64]) -> OrderParameter {
    if theta.is_empty() {
        return OrderParameter::default();
    }
    let (c, s, n) = phasor_sums(theta.iter().copied());
    let n = n as f64;
    OrderParameter::from_mean(c / n, s / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_phase_keeps_nan_magnitude() {
        let op = order_parameter(&[f64::NAN, 0.0]);
        assert!(op.r.is_nan(), "r={}", op.r);
        assert!(OrderParameter::from_mean(f64::NAN, 0.0).r.is_nan());
        assert_eq!(OrderParameter::from_mean(1.0 + 1e-15, 0.0).r, 1.0);
    }

    #[test]
    fn test_wrap_range() {
        for &x in &[0.0, PI, -PI, 3.0 * PI, -3.0 * PI, 100.0, -100.0, 1e-17, -1e-17] {
            let w = wrap_phase(x);
            assert!(w > -PI && w <= PI, "wrap({x}) = {w}");
        }
        assert_eq!(wrap_phase(-PI), PI);
        assert!((wrap_phase(TAU + 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_nan_propagates() {
        assert!(wrap_phase(f64::NAN).is_nan());
    }

    #[test]
    fn test_angle_diff_short_way_round() {
        let d = angle_diff(-3.0, 3.0);
        assert!((d - (TAU - 6.0)).abs() < 1e-12, "d={d}");
    }

    #[test]
    fn test_identical_phases_r_one() {
        let op = order_parameter(&[0.7; 33]);
        assert!((op.r - 1.0).abs() < 1e-12);
        assert!((op.psi - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_spread_r_zero() {
        let n = 12;
        let theta: Vec<f64> = (0..n).map(|i| i as f64 * TAU / n as f64).collect();
        let op = order_parameter(&theta);
        assert!(op.r < 1e-12, "R={}", op.r);
    }

    #[test]
    fn test_antipodal_pair_is_deterministic() {
        let op = order_parameter(&[0.0, PI]);
        assert!(op.r < 1e-12);
        assert!(op.psi > -PI && op.psi <= PI);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(order_parameter(&[]), OrderParameter::default());
    }

    #[test]
    fn test_single_node() {
        let op = order_parameter(&[-2.0]);
        assert!((op.r - 1.0).abs() < 1e-12);
        assert!((op.psi + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_psi_never_minus_pi() {
        let op = order_parameter(&[PI, PI]);
        assert!(op.psi > -PI && op.psi <= PI);
        assert!((op.psi - PI).abs() < 1e-12);
    }

    #[test]
    fn test_range_over_many_inputs() {
        let mut x = 0.123_f64;
        for n in 1..40 {
            let theta: Vec<f64> = (0..n)
                .map(|_| {
                    x = (x * 7.31 + 1.7).rem_euclid(50.0) - 25.0;
                    x
                })
                .collect();
            let op = order_parameter(&theta);
            assert!((0.0..=1.0).contains(&op.r));
            assert!(op.psi > -PI && op.psi <= PI);
        }
    }

    #[test]
    fn test_pull_matches_pairwise_sum() {
        let theta = [0.1, 1.3, -2.0, 2.9, 0.4];
        let op = order_parameter(&theta);
        let n = theta.len() as f64;
        for &ti in &theta {
            let pairwise: f64 = theta.iter().map(|&tj| (tj - ti).sin()).sum::<f64>() / n;
            assert!((op.pull_on(ti) - pairwise).abs() < 1e-12);
        }
    }
}
