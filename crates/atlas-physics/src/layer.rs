// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Single-Layer Kuramoto Step
// ─────────────────────────────────────────────────────────────────────
//! Forward-Euler step for one all-to-all layer:
//!
//!   dθ_i/dt = ω_i + (K/N) Σ_j sin(θ_j − θ_i)
//!           = ω_i + K · R · sin(ψ − θ_i)
//!
//! The mean-field form is O(N); the pairwise form is O(N²) and kept
//! for cross-checking and for callers that select it explicitly.

use serde::{Deserialize, Serialize};

use atlas_types::CouplingKernel;

use crate::phase::{order_parameter, wrap_phase, OrderParameter};

/// One layer of phase oscillators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorLayer {
    /// Phases θ, wrapped to (−π, π].
    pub theta: Vec<f64>,
    /// Natural frequencies ω. Mutable only through the adaptation stage.
    pub omega: Vec<f64>,
    /// Intra-layer coupling K.
    pub k: f64,
}

impl OscillatorLayer {
    /// Caller guarantees `theta.len() == omega.len()`.
    pub fn new(theta: Vec<f64>, omega: Vec<f64>, k: f64) -> Self {
        debug_assert_eq!(theta.len(), omega.len());
        let theta = theta.into_iter().map(wrap_phase).collect();
        Self { theta, omega, k }
    }

    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }

    pub fn order_parameter(&self) -> OrderParameter {
        order_parameter(&self.theta)
    }

    /// Advance this layer alone by one step.
    pub fn step(&mut self, dt: f64) {
        self.theta = step_layer(&self.theta, &self.omega, self.k, dt);
    }
}

/// (1/N) Σ_j sin(θ_j − θ_i) evaluated directly.
#[inline]
pub fn pairwise_pull(theta: &[f64], i: usize) -> f64 {
    let ti = theta[i];
    theta.iter().map(|&tj| (tj - ti).sin()).sum::<f64>() / theta.len() as f64
}

/// Unscaled coupling term for every node, written into `out`.
///
/// Multiplying `out[i]` by K_i yields the intra-layer contribution.
pub fn coupling_pulls(theta: &[f64], kernel: CouplingKernel, out: &mut [f64]) {
    match kernel {
        CouplingKernel::MeanField => {
            let op = order_parameter(theta);
            for (o, &th) in out.iter_mut().zip(theta) {
                *o = op.pull_on(th);
            }
        }
        CouplingKernel::Pairwise => {
            for (i, o) in out.iter_mut().enumerate() {
                *o = pairwise_pull(theta, i);
            }
        }
    }
}

fn step_with(theta: &[f64], omega: &[f64], k: f64, dt: f64, kernel: CouplingKernel) -> Vec<f64> {
    let mut pull = vec![0.0; theta.len()];
    coupling_pulls(theta, kernel, &mut pull);
    theta
        .iter()
        .zip(omega)
        .zip(&pull)
        .map(|((&th, &w), &p)| wrap_phase(th + dt * (w + k * p)))
        .collect()
}

/// Single-layer step using the O(N) complex order parameter.
///
/// Output has the same length as `theta` and is wrapped to (−π, π].
pub fn step_layer(theta: &[f64], omega: &[f64], k: f64, dt: f64) -> Vec<f64> {
    step_with(theta, omega, k, dt, CouplingKernel::MeanField)
}

/// Single-layer step using the O(N²) pairwise sum.
pub fn step_layer_pairwise(theta: &[f64], omega: &[f64], k: f64, dt: f64) -> Vec<f64> {
    step_with(theta, omega, k, dt, CouplingKernel::Pairwise)
}
