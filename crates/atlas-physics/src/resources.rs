// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Resource Dynamics Stage
// ─────────────────────────────────────────────────────────────────────
//! Per-node resource r ∈ [0, 1], forward-Euler with the phase dt:
//!
//!   dr/dt = gain · R_local · (1 − r) − leak · (1 − R_local) · r
//!
//! Resources scale the node's intra-layer coupling through
//! f(r) = floor + (1 − floor) · r.

use serde::{Deserialize, Serialize};

use atlas_types::ResourceConfig;

use crate::phase::OrderParameter;

/// Rate constants of the resource stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceDynamics {
    pub gain: f64,
    pub leak: f64,
    pub coupling_floor: f64,
}

impl From<&ResourceConfig> for ResourceDynamics {
    fn from(cfg: &ResourceConfig) -> Self {
        Self {
            gain: cfg.gain,
            leak: cfg.leak,
            coupling_floor: cfg.coupling_floor,
        }
    }
}

impl ResourceDynamics {
    /// f(r): multiplier on K for a node holding resource `r`.
    #[inline]
    pub fn coupling_scale(&self, r: f64) -> f64 {
        self.coupling_floor + (1.0 - self.coupling_floor) * r
    }

    /// dr/dt for one node.
    #[inline]
    pub fn rate(&self, r: f64, r_local: f64) -> f64 {
        self.gain * r_local * (1.0 - r) - self.leak * (1.0 - r_local) * r
    }

    /// Integrate one step in place, clamping to [0, 1].
    ///
    /// NaN survives the clamp so the caller's finiteness check sees it.
    pub fn step(&self, r: &mut [f64], local: &[OrderParameter], dt: f64) {
        for (ri, op) in r.iter_mut().zip(local) {
            *ri = (*ri + dt * self.rate(*ri, op.r)).clamp(0.0, 1.0);
        }
    }
}
