// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Oscillator Field
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Multi-layer Kuramoto physics: single-layer step kernels, the coupled
//! multi-layer field with frequency adaptation and resource stages,
//! environment drivers, coupling schedules and the built-in presets.

pub mod adaptation;
pub mod community;
pub mod driver;
pub mod field;
pub mod init;
pub mod layer;
pub mod phase;
pub mod presets;
pub mod resources;
pub mod schedule;

pub use adaptation::adapt_frequencies;
pub use community::LocalScope;
pub use driver::{CompositeDriver, PhaseDriver, SineDriver};
pub use field::{FieldSnapshot, MultiLayerField};
pub use init::InitialState;
pub use layer::{coupling_pulls, step_layer, step_layer_pairwise, OscillatorLayer};
pub use phase::{angle_diff, order_parameter, phasor_sums, wrap_phase, OrderParameter};
pub use presets::{
    adjacency_grid, adjacency_petal, lattice_preset, petal_preset, preset, presets_from_json,
    require_preset, PRESET_NAMES,
};
pub use resources::ResourceDynamics;
pub use schedule::{
    breath_envelope, cosine_ease, BreathSchedule, CouplingSchedule, Intervention,
    InterventionSchedule,
};
