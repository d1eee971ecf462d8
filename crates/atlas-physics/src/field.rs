// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Multi-Layer Oscillator Field
// ─────────────────────────────────────────────────────────────────────
//! Forward-Euler integrator for L coupled Kuramoto layers:
//!
//!   dθ_l,i/dt = ω_l,i
//!             + K_l · f(r_l,i) · R_l · sin(ψ_l − θ_l,i)    (intra-layer)
//!             + Σ_{m≠l} γ_lm · sin(ψ_m,i − θ_l,i)         (inter-layer)
//!             + γ_env · sin(φ_env − θ_l,i)                (entrained layers)
//!
//! followed by two independent stages on the new phases:
//! frequency adaptation, then resource dynamics.
//!
//! Every delta is computed from a read-only snapshot into scratch
//! buffers; the state is committed only after the whole step is finite.

use serde::{Deserialize, Serialize};

use atlas_types::{
    AtlasError, AtlasResult, CouplingKernel, EnvironmentConfig, FieldConfig, InitConfig,
    InterLayerMode,
};

use crate::adaptation::adapt_frequencies;
use crate::community::LocalScope;
use crate::init::InitialState;
use crate::layer::{coupling_pulls, OscillatorLayer};
use crate::phase::{phasor_sums, wrap_phase, OrderParameter};
use crate::resources::ResourceDynamics;
use crate::schedule::CouplingSchedule;

/// Owned copy of the mutable field state after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub step: u64,
    pub t: f64,
    /// L × N phases in (−π, π].
    pub theta: Vec<Vec<f64>>,
    /// L × N natural frequencies.
    pub omega: Vec<Vec<f64>>,
    /// L × N resources when resource dynamics are enabled.
    pub resources: Option<Vec<Vec<f64>>>,
}

/// L layers of N phase oscillators with inter-layer coupling.
#[derive(Debug, Clone)]
pub struct MultiLayerField {
    cfg: FieldConfig,
    layers: Vec<OscillatorLayer>,
    resources: Option<Vec<Vec<f64>>>,
    resource_dynamics: Option<ResourceDynamics>,
    /// Per-layer flag: layer is entrained by the environment driver.
    entrained: Vec<bool>,
    scope: LocalScope,
    step_count: u64,
    // Scratch
    layer_order: Vec<OrderParameter>,
    pull: Vec<f64>,
    next_theta: Vec<Vec<f64>>,
    next_omega: Vec<Vec<f64>>,
    next_resources: Vec<Vec<f64>>,
    local: Vec<OrderParameter>,
}

fn check_grid(name: &str, grid: &[Vec<f64>], l: usize, n: usize) -> AtlasResult<()> {
    if grid.len() != l || grid.iter().any(|row| row.len() != n) {
        return Err(AtlasError::Config(format!(
            "{name} must be {l} x {n}, got {} rows",
            grid.len()
        )));
    }
    if grid.iter().flatten().any(|v| !v.is_finite()) {
        return Err(AtlasError::Config(format!("{name} contains NaN or Inf")));
    }
    Ok(())
}

impl MultiLayerField {
    /// Build a field from a validated configuration and explicit initial state.
    ///
    /// With resource dynamics enabled and `init.resources` unset, every node
    /// starts at `ResourceConfig::initial` when given, else at the midpoint
    /// of `initial_range`. `from_config` draws them uniformly instead.
    pub fn new(cfg: FieldConfig, init: InitialState) -> AtlasResult<Self> {
        cfg.validate()?;
        let (l, n) = (cfg.n_layers, cfg.n_nodes);
        check_grid("theta", &init.theta, l, n)?;
        check_grid("omega", &init.omega, l, n)?;

        let resource_dynamics = cfg.resources.as_ref().map(ResourceDynamics::from);
        let resources = match (&cfg.resources, init.resources) {
            (None, _) => None,
            (Some(_), Some(r)) => {
                check_grid("resources", &r, l, n)?;
                if r.iter().flatten().any(|v| !(0.0..=1.0).contains(v)) {
                    return Err(AtlasError::Config(
                        "resources must lie in [0, 1]".to_string(),
                    ));
                }
                Some(r)
            }
            (Some(res), None) => Some(res.initial.clone().unwrap_or_else(|| {
                let mid = 0.5 * (res.initial_range.0 + res.initial_range.1);
                vec![vec![mid; n]; l]
            })),
        };

        let mut entrained = vec![false; l];
        if let Some(EnvironmentConfig { layers, .. }) = &cfg.environment {
            for &idx in layers {
                entrained[idx] = true;
            }
        }

        let layers: Vec<OscillatorLayer> = init
            .theta
            .into_iter()
            .zip(init.omega)
            .zip(&cfg.intra_k)
            .map(|((theta, omega), &k)| OscillatorLayer::new(theta, omega, k))
            .collect();

        let scope = LocalScope::from_labels(cfg.groups.as_deref());

        log::info!(
            "MultiLayerField: {l} layers x {n} nodes, dt={}, mode={:?}, kernel={:?}, \
             adaptation={}, resources={}, entrained={:?}, local_groups={}",
            cfg.dt,
            cfg.inter_layer_mode,
            cfg.kernel,
            cfg.alpha.iter().any(|&a| a != 0.0),
            resources.is_some(),
            cfg.environment.as_ref().map(|e| &e.layers),
            scope.n_groups(),
        );

        Ok(Self {
            layers,
            resources,
            resource_dynamics,
            entrained,
            scope,
            step_count: 0,
            layer_order: vec![OrderParameter::default(); l],
            pull: vec![0.0; n],
            next_theta: vec![vec![0.0; n]; l],
            next_omega: vec![vec![0.0; n]; l],
            next_resources: vec![vec![0.0; n]; l],
            local: Vec::with_capacity(n),
            cfg,
        })
    }

    /// Build a field, drawing any initial values `init` does not pin down.
    pub fn from_config(cfg: FieldConfig, init: &InitConfig) -> AtlasResult<Self> {
        cfg.validate()?;
        let state = InitialState::draw(&cfg, init)?;
        Self::new(cfg, state)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &FieldConfig {
        &self.cfg
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.cfg.n_nodes
    }

    pub fn dt(&self) -> f64 {
        self.cfg.dt
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulation time, step_count · dt.
    pub fn time(&self) -> f64 {
        self.step_count as f64 * self.cfg.dt
    }

    pub fn layers(&self) -> &[OscillatorLayer] {
        &self.layers
    }

    pub fn layer(&self, l: usize) -> Option<&OscillatorLayer> {
        self.layers.get(l)
    }

    /// Borrowed phase sequences, one per layer.
    pub fn phases(&self) -> Vec<&[f64]> {
        self.layers.iter().map(|layer| layer.theta.as_slice()).collect()
    }

    /// Live K_l per layer; differs from `config().intra_k` after
    /// `set_intra_k` or a schedule.
    pub fn intra_k(&self) -> Vec<f64> {
        self.layers.iter().map(|layer| layer.k).collect()
    }

    /// Override K_l for the following steps. The configured base is kept.
    pub fn set_intra_k(&mut self, l: usize, k: f64) -> AtlasResult<()> {
        let n_layers = self.layers.len();
        let layer = self.layers.get_mut(l).ok_or_else(|| {
            AtlasError::Validation(format!("layer {l} out of range for {n_layers} layers"))
        })?;
        if !k.is_finite() {
            return Err(AtlasError::Validation(format!(
                "intra_k for layer {l} must be finite, got {k}"
            )));
        }
        layer.k = k;
        Ok(())
    }

    /// Sample `schedule` at the current step and time and set every K_l.
    ///
    /// All layers are checked before any is changed.
    pub fn apply_schedule(&mut self, schedule: &dyn CouplingSchedule) -> AtlasResult<()> {
        let (step, t) = (self.step_count, self.time());
        let ks: Vec<f64> = self
            .cfg
            .intra_k
            .iter()
            .enumerate()
            .map(|(l, &base)| schedule.k_at(l, step, t, base))
            .collect();
        if let Some((l, k)) = ks.iter().enumerate().find(|(_, k)| !k.is_finite()) {
            return Err(AtlasError::Validation(format!(
                "schedule gave non-finite intra_k {k} for layer {l} at step {step}"
            )));
        }
        for (layer, k) in self.layers.iter_mut().zip(ks) {
            layer.k = k;
        }
        Ok(())
    }

    pub fn resources(&self) -> Option<&[Vec<f64>]> {
        self.resources.as_deref()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            step: self.step_count,
            t: self.time(),
            theta: self.layers.iter().map(|layer| layer.theta.clone()).collect(),
            omega: self.layers.iter().map(|layer| layer.omega.clone()).collect(),
            resources: self.resources.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Step
    // ------------------------------------------------------------------

    /// Advance every layer by one dt.
    ///
    /// `driver_phase` is φ_env for this step; `None` disables the
    /// environment term. On `AtlasError::Numerical` the field keeps the
    /// state of the previous step.
    pub fn step(&mut self, driver_phase: Option<f64>) -> AtlasResult<()> {
        if let Some(phi) = driver_phase {
            if !phi.is_finite() {
                return Err(AtlasError::Validation(format!(
                    "driver phase must be finite, got {phi}"
                )));
            }
        }

        self.phase_stage(driver_phase);
        self.adaptation_stage();
        self.resource_stage();

        if let Some(detail) = self.first_non_finite() {
            let step = self.step_count + 1;
            log::error!("MultiLayerField: numerical instability at step {step}: {detail}");
            return Err(AtlasError::Numerical { step, detail });
        }
        self.commit();
        Ok(())
    }

    /// Phase-coupling stage: writes θ(t + dt) into `next_theta`.
    fn phase_stage(&mut self, driver_phase: Option<f64>) {
        let dt = self.cfg.dt;
        let kernel = self.cfg.kernel;
        let mode = self.cfg.inter_layer_mode;
        let env = driver_phase.zip(self.cfg.environment.as_ref().map(|e| e.strength));

        for (op, layer) in self.layer_order.iter_mut().zip(&self.layers) {
            *op = layer.order_parameter();
        }

        for l in 0..self.layers.len() {
            let layer = &self.layers[l];
            coupling_pulls(&layer.theta, kernel, &mut self.pull);
            let gamma_row = &self.cfg.inter_k[l];
            let res_row = self.resources.as_ref().map(|r| &r[l]);

            for i in 0..layer.theta.len() {
                let th = layer.theta[i];

                let k_eff = match (res_row, &self.resource_dynamics) {
                    (Some(r), Some(dynamics)) => layer.k * dynamics.coupling_scale(r[i]),
                    _ => layer.k,
                };

                let mut inter = 0.0;
                for (m, &gamma) in gamma_row.iter().enumerate() {
                    if m == l {
                        continue;
                    }
                    let target = match mode {
                        InterLayerMode::Node => self.layers[m].theta[i],
                        InterLayerMode::MeanField => self.layer_order[m].psi,
                    };
                    inter += gamma * (target - th).sin();
                }

                let ext = match env {
                    Some((phi, strength)) if self.entrained[l] => strength * (phi - th).sin(),
                    _ => 0.0,
                };

                let dtheta = layer.omega[i] + k_eff * self.pull[i] + inter + ext;
                self.next_theta[l][i] = wrap_phase(th + dt * dtheta);
            }
        }
    }

    /// Adaptation stage: writes ω into `next_omega`, measured on the new phases.
    fn adaptation_stage(&mut self) {
        for l in 0..self.layers.len() {
            self.next_omega[l].copy_from_slice(&self.layers[l].omega);
            let alpha = self.cfg.alpha_for(l);
            if alpha == 0.0 {
                continue;
            }
            self.scope.local_order(&self.next_theta[l], &mut self.local);
            adapt_frequencies(&mut self.next_omega[l], &self.next_theta[l], &self.local, alpha);
        }
    }

    /// Resource stage: writes r into `next_resources`, driven by new-phase local coherence.
    fn resource_stage(&mut self) {
        let (Some(resources), Some(dynamics)) = (&self.resources, self.resource_dynamics) else {
            return;
        };
        for l in 0..self.layers.len() {
            self.next_resources[l].copy_from_slice(&resources[l]);
            self.scope.local_order(&self.next_theta[l], &mut self.local);
            dynamics.step(&mut self.next_resources[l], &self.local, self.cfg.dt);
        }
    }

    fn first_non_finite(&self) -> Option<String> {
        let find = |name: &str, grid: &[Vec<f64>]| {
            grid.iter().enumerate().find_map(|(l, row)| {
                row.iter()
                    .position(|v| !v.is_finite())
                    .map(|i| format!("layer {l} node {i} {name} = {}", row[i]))
            })
        };
        find("theta", &self.next_theta)
            .or_else(|| find("omega", &self.next_omega))
            .or_else(|| {
                self.resources
                    .as_ref()
                    .and_then(|_| find("resource", &self.next_resources))
            })
    }

    fn commit(&mut self) {
        for (l, layer) in self.layers.iter_mut().enumerate() {
            std::mem::swap(&mut layer.theta, &mut self.next_theta[l]);
            std::mem::swap(&mut layer.omega, &mut self.next_omega[l]);
        }
        if let Some(resources) = self.resources.as_mut() {
            for (row, next) in resources.iter_mut().zip(self.next_resources.iter_mut()) {
                std::mem::swap(row, next);
            }
        }
        self.step_count += 1;
    }

    /// Run `n_steps` without an environment driver.
    pub fn run(&mut self, n_steps: u64) -> AtlasResult<()> {
        for _ in 0..n_steps {
            self.step(None)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observables
    // ------------------------------------------------------------------

    /// Order parameter of one layer.
    pub fn layer_order_parameter(&self, l: usize) -> Option<OrderParameter> {
        self.layers.get(l).map(OscillatorLayer::order_parameter)
    }

    /// Order parameter of all nodes of all layers pooled.
    pub fn pooled_order_parameter(&self) -> OrderParameter {
        let (c, s, n) = phasor_sums(self.layers.iter().flat_map(|l| l.theta.iter().copied()));
        if n == 0 {
            return OrderParameter::default();
        }
        OrderParameter::from_mean(c / n as f64, s / n as f64)
    }

    /// Kernel currently selected for intra-layer coupling.
    pub fn kernel(&self) -> CouplingKernel {
        self.cfg.kernel
    }
}
