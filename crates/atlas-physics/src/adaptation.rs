// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Frequency Adaptation Stage
// ─────────────────────────────────────────────────────────────────────
//! Natural-frequency drift toward local consensus, applied after the
//! phase-coupling stage:
//!
//!   ω_i ← ω_i + α · angle(e^{i(ψ_local,i − θ_i)})
//!
//! α = 0 leaves ω untouched.

use crate::phase::{angle_diff, OrderParameter};

/// Apply one adaptation update in place.
///
/// `local[i]` is the local order parameter of node i, computed from the
/// same `theta` the update is measured against.
pub fn adapt_frequencies(omega: &mut [f64], theta: &[f64], local: &[OrderParameter], alpha: f64) {
    if alpha == 0.0 {
        return;
    }
    for ((w, &th), op) in omega.iter_mut().zip(theta).zip(local) {
        *w += alpha * angle_diff(op.psi, th);
    }
}
