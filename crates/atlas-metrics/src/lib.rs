// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Metrics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Metrics extracted from multi-layer phase snapshots.
//!
//! - Extractor: coherence, cross-layer sync, drift, readiness, choice score
//! - Summary: whole-run aggregates

pub mod extractor;
pub mod summary;

pub use atlas_physics::{order_parameter, OrderParameter};
pub use extractor::{choice_score, cross_sync, phase_entropy, readiness, MetricsExtractor};
pub use summary::RunSummary;
