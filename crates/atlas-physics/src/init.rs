// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Initial State
// ─────────────────────────────────────────────────────────────────────
//! Seeded initial phases, natural frequencies and resources.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use atlas_types::{AtlasError, AtlasResult, FieldConfig, InitConfig};

/// L × N starting state of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub theta: Vec<Vec<f64>>,
    pub omega: Vec<Vec<f64>>,
    /// Required when the field has resource dynamics; ignored otherwise.
    pub resources: Option<Vec<Vec<f64>>>,
}

impl InitialState {
    /// Explicit phases and frequencies, no resources.
    pub fn new(theta: Vec<Vec<f64>>, omega: Vec<Vec<f64>>) -> Self {
        Self {
            theta,
            omega,
            resources: None,
        }
    }

    /// Resolve explicit vectors from `init`, drawing the rest from a
    /// ChaCha8 stream seeded with `init.seed`.
    ///
    /// Draw order is fixed (ω, then θ, then r, layer by layer) so the
    /// same seed always reproduces the same run.
    pub fn draw(field: &FieldConfig, init: &InitConfig) -> AtlasResult<Self> {
        init.validate(field.n_layers, field.n_nodes)?;
        let (l, n) = (field.n_layers, field.n_nodes);
        let mut rng = ChaCha8Rng::seed_from_u64(init.seed);

        let normal = Normal::new(init.omega_mean, init.omega_std)
            .map_err(|e| AtlasError::Config(format!("omega distribution: {e}")))?;
        let omega = match &init.omega {
            Some(omega) => omega.clone(),
            None => (0..l)
                .map(|_| (0..n).map(|_| normal.sample(&mut rng)).collect())
                .collect(),
        };

        let phase = Uniform::new(-PI, PI);
        let theta = match &init.theta {
            Some(theta) => theta.clone(),
            None => (0..l)
                .map(|_| (0..n).map(|_| phase.sample(&mut rng)).collect())
                .collect(),
        };

        let resources = match &field.resources {
            None => None,
            Some(res) => match &res.initial {
                Some(initial) => Some(initial.clone()),
                None => {
                    let (lo, hi) = res.initial_range;
                    Some(
                        (0..l)
                            .map(|_| {
                                (0..n)
                                    .map(|_| {
                                        if hi > lo {
                                            rng.gen_range(lo..hi)
                                        } else {
                                            lo
                                        }
                                    })
                                    .collect()
                            })
                            .collect(),
                    )
                }
            },
        };

        Ok(Self {
            theta,
            omega,
            resources,
        })
    }
}
