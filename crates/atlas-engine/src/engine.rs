// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Simulation (Run Orchestrator)
// ─────────────────────────────────────────────────────────────────────
//! One step of a run:
//!   0. Sample the coupling schedule and driver (`run_with` only)
//!   1. Validate the driver phase
//!   2. Advance the multi-layer field (phase, adaptation, resources)
//!   3. Extract metrics from the committed phases
//!   4. Build the interchange record
//!
//! The simulation never writes files and keeps no history; callers own
//! whatever they collect from `step` or `run`.

use serde::Serialize;

use atlas_metrics::{MetricsExtractor, RunSummary};
use atlas_physics::{
    require_preset, CouplingSchedule, FieldSnapshot, MultiLayerField, PhaseDriver,
};
use atlas_types::{AtlasResult, RunConfig, RunFlags, StepMetrics, StepRecord};

/// Everything produced by one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutput {
    pub state: FieldSnapshot,
    pub metrics: StepMetrics,
    pub record: StepRecord,
    /// φ_env used for this step, if any.
    pub driver_phase: Option<f64>,
    /// dφ/dt of the driver at the sampled time; set by `run`, not `step`.
    pub driver_omega: Option<f64>,
}

/// A field, its metrics extractor and the run flags, advanced together.
#[derive(Debug, Clone)]
pub struct Simulation {
    cfg: RunConfig,
    field: MultiLayerField,
    extractor: MetricsExtractor,
}

impl Simulation {
    /// Validate `cfg`, draw the initial state and build the field.
    pub fn new(cfg: RunConfig) -> AtlasResult<Self> {
        cfg.validate()?;
        let field = MultiLayerField::from_config(cfg.field.clone(), &cfg.init)?;
        let extractor = MetricsExtractor::new(cfg.metrics.clone());
        log::info!(
            "Simulation '{}': {} layers x {} nodes, seed={}, flags={:?}",
            cfg.name,
            field.n_layers(),
            field.n_nodes(),
            cfg.init.seed,
            cfg.flags,
        );
        Ok(Self {
            cfg,
            field,
            extractor,
        })
    }

    /// Build from a built-in preset name.
    pub fn from_preset(name: &str) -> AtlasResult<Self> {
        Self::new(require_preset(name)?)
    }

    pub fn config(&self) -> &RunConfig {
        &self.cfg
    }

    pub fn field(&self) -> &MultiLayerField {
        &self.field
    }

    pub fn flags(&self) -> RunFlags {
        self.cfg.flags
    }

    pub fn step_count(&self) -> u64 {
        self.field.step_count()
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.field.time()
    }

    /// Override K_l for the following steps.
    pub fn set_intra_k(&mut self, l: usize, k: f64) -> AtlasResult<()> {
        self.field.set_intra_k(l, k)
    }

    /// Advance one step with an optional environment phase.
    ///
    /// On error the field and the drift snapshot are left as they were.
    pub fn step(&mut self, driver_phase: Option<f64>) -> AtlasResult<StepOutput> {
        self.field.step(driver_phase)?;

        let dt = self.field.dt();
        let flags = self.cfg.flags;
        let metrics = self.extractor.extract(&self.field.phases(), dt, flags);
        let record = StepRecord::new(self.field.step_count(), self.field.time(), &metrics, flags);

        log::debug!(
            "step {}: R_total={:.4} cross_sync={:.4} drift={:.4} ready={:.4} choice={}",
            record.step,
            record.r_total,
            record.cross_sync,
            record.drift,
            record.ready,
            record.choice_score,
        );

        Ok(StepOutput {
            state: self.field.snapshot(),
            metrics,
            record,
            driver_phase,
            driver_omega: None,
        })
    }

    /// Run `n_steps`, sampling `driver` at the current time before each step.
    ///
    /// Stops at the first error; steps already taken stay applied.
    pub fn run(
        &mut self,
        n_steps: u64,
        driver: Option<&dyn PhaseDriver>,
    ) -> AtlasResult<Vec<StepOutput>> {
        self.run_with(n_steps, driver, None)
    }

    /// `run` with an optional coupling schedule applied before each step.
    pub fn run_with(
        &mut self,
        n_steps: u64,
        driver: Option<&dyn PhaseDriver>,
        schedule: Option<&dyn CouplingSchedule>,
    ) -> AtlasResult<Vec<StepOutput>> {
        // n_steps may be far larger than the run that completes.
        let mut outputs = Vec::new();
        for _ in 0..n_steps {
            if let Some(s) = schedule {
                self.field.apply_schedule(s)?;
            }
            let t = self.time();
            let phase = driver.map(|d| d.phase_at(t));
            let mut out = self.step(phase)?;
            out.driver_omega = driver.map(|d| d.omega_at(t));
            outputs.push(out);
        }
        Ok(outputs)
    }

    /// Run the config's suggested number of steps.
    pub fn run_configured(
        &mut self,
        driver: Option<&dyn PhaseDriver>,
    ) -> AtlasResult<Vec<StepOutput>> {
        self.run(self.cfg.steps, driver)
    }
}

/// Aggregate a finished run.
pub fn summarize(outputs: &[StepOutput]) -> RunSummary {
    let metrics: Vec<StepMetrics> = outputs.iter().map(|o| o.metrics.clone()).collect();
    RunSummary::from_metrics(&metrics)
}

/// Header plus one comma-separated row per step.
pub fn to_csv(records: &[StepRecord]) -> String {
    let mut out = StepRecord::header_line();
    out.push('\n');
    for record in records {
        out.push_str(&record.to_row());
        out.push('\n');
    }
    out
}
