// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Run Orchestrator
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Drives a multi-layer oscillator field one step at a time and turns
//! each committed state into metrics and an interchange record.
//!
//! Architecture:
//!   - MultiLayerField (atlas-physics): phase, adaptation and resource stages
//!   - MetricsExtractor (atlas-metrics): coherence, drift, readiness, choice
//!   - Simulation: validates the run config and pairs the two per step

pub mod engine;

pub use engine::{summarize, to_csv, Simulation, StepOutput};
