// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Configuration records, error hierarchy and per-step record types
//! shared by the oscillator field, the metrics extractor and the run
//! orchestrator.

pub mod config;
pub mod error;
pub mod record;

pub use config::{
    CouplingKernel, EnvironmentConfig, FieldConfig, InitConfig, InterLayerMode, MetricsConfig,
    ResourceConfig, RunConfig, RunFlags,
};
pub use error::{AtlasError, AtlasResult};
pub use record::{clamp_score, StepMetrics, StepRecord};
