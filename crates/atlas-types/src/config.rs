// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Run Configuration
// ─────────────────────────────────────────────────────────────────────
//! Plain-data configuration records. A named preset is a `RunConfig`
//! value; nothing here reads files.

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, AtlasResult};

/// What ψ_m,i means in the inter-layer term γ_lm · sin(ψ_m,i − θ_l,i).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterLayerMode {
    /// Node i in layer l couples to node i in layer m (role coherence).
    #[default]
    Node,
    /// Node i in layer l couples to the mean phase of layer m.
    MeanField,
}

/// Intra-layer coupling kernel. Both are mathematically identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingKernel {
    /// O(N): K · R · sin(ψ − θ_i) via the complex order parameter.
    #[default]
    MeanField,
    /// O(N²): (K/N) · Σ_j sin(θ_j − θ_i).
    Pairwise,
}

/// Per-node resource dynamics.
///
///   dr/dt = gain · R_local · (1 − r) − leak · (1 − R_local) · r
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub gain: f64,
    pub leak: f64,
    /// f(r) = floor + (1 − floor) · r scales the intra-layer coupling.
    pub coupling_floor: f64,
    /// Explicit initial resources, L × N. When absent, drawn uniformly from
    /// `initial_range` by seeded init, or its midpoint for a bare `InitialState`.
    pub initial: Option<Vec<Vec<f64>>>,
    pub initial_range: (f64, f64),
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            gain: 0.5,
            leak: 0.3,
            coupling_floor: 0.2,
            initial: None,
            initial_range: (0.3, 0.7),
        }
    }
}

/// Entrainment of designated layers to an external driver phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// γ_env.
    pub strength: f64,
    /// Indices of the entrained layers.
    pub layers: Vec<usize>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            strength: 0.2,
            layers: vec![0],
        }
    }
}

/// Static shape and coupling parameters of a multi-layer field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// L.
    pub n_layers: usize,
    /// N, uniform across layers.
    pub n_nodes: usize,
    /// K_l, one per layer. Negative values model repulsion.
    pub intra_k: Vec<f64>,
    /// γ, L × L. Not required symmetric; the diagonal is ignored.
    pub inter_k: Vec<Vec<f64>>,
    pub dt: f64,
    /// Frequency adaptation rate α per layer. Empty means disabled everywhere.
    pub alpha: Vec<f64>,
    pub resources: Option<ResourceConfig>,
    pub environment: Option<EnvironmentConfig>,
    pub inter_layer_mode: InterLayerMode,
    pub kernel: CouplingKernel,
    /// Group label per node. When set, "local" coherence is taken over the
    /// node's group within its layer; otherwise over the whole layer.
    pub groups: Option<Vec<usize>>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            n_layers: 1,
            n_nodes: 64,
            intra_k: vec![0.5],
            inter_k: vec![vec![0.0]],
            dt: 0.01,
            alpha: Vec::new(),
            resources: None,
            environment: None,
            inter_layer_mode: InterLayerMode::Node,
            kernel: CouplingKernel::MeanField,
            groups: None,
        }
    }
}

fn ensure_finite(name: &str, values: &[f64]) -> AtlasResult<()> {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AtlasError::Config(format!("{name}[{i}] is not finite: {v}")));
    }
    Ok(())
}

fn ensure_grid(name: &str, grid: &[Vec<f64>], rows: usize, cols: usize) -> AtlasResult<()> {
    if grid.len() != rows {
        return Err(AtlasError::Config(format!(
            "{name} must have {rows} rows, got {}",
            grid.len()
        )));
    }
    for (r, row) in grid.iter().enumerate() {
        if row.len() != cols {
            return Err(AtlasError::Config(format!(
                "{name}[{r}] must have {cols} entries, got {}",
                row.len()
            )));
        }
        ensure_finite(&format!("{name}[{r}]"), row)?;
    }
    Ok(())
}

impl FieldConfig {
    /// Validate shapes and finiteness of every static parameter.
    pub fn validate(&self) -> AtlasResult<()> {
        if self.n_layers == 0 {
            return Err(AtlasError::Config("n_layers must be >= 1".to_string()));
        }
        if self.n_nodes == 0 {
            return Err(AtlasError::Config("n_nodes must be >= 1".to_string()));
        }
        if self.intra_k.len() != self.n_layers {
            return Err(AtlasError::Config(format!(
                "intra_k must have {} entries, got {}",
                self.n_layers,
                self.intra_k.len()
            )));
        }
        ensure_finite("intra_k", &self.intra_k)?;
        ensure_grid("inter_k", &self.inter_k, self.n_layers, self.n_layers)?;

        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(AtlasError::Config(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }

        if !self.alpha.is_empty() {
            if self.alpha.len() != self.n_layers {
                return Err(AtlasError::Config(format!(
                    "alpha must be empty or have {} entries, got {}",
                    self.n_layers,
                    self.alpha.len()
                )));
            }
            ensure_finite("alpha", &self.alpha)?;
        }

        if let Some(res) = &self.resources {
            ensure_finite("resources.gain/leak", &[res.gain, res.leak])?;
            if res.gain < 0.0 || res.leak < 0.0 {
                return Err(AtlasError::Config(format!(
                    "resource gain and leak must be >= 0, got {} / {}",
                    res.gain, res.leak
                )));
            }
            if !(0.0..=1.0).contains(&res.coupling_floor) {
                return Err(AtlasError::Config(format!(
                    "resources.coupling_floor must be in [0, 1], got {}",
                    res.coupling_floor
                )));
            }
            let (lo, hi) = res.initial_range;
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
                return Err(AtlasError::Config(format!(
                    "resources.initial_range must satisfy 0 <= lo <= hi <= 1, got ({lo}, {hi})"
                )));
            }
            if let Some(initial) = &res.initial {
                ensure_grid("resources.initial", initial, self.n_layers, self.n_nodes)?;
                if initial.iter().flatten().any(|r| !(0.0..=1.0).contains(r)) {
                    return Err(AtlasError::Config(
                        "resources.initial values must be in [0, 1]".to_string(),
                    ));
                }
            }
        }

        if let Some(env) = &self.environment {
            ensure_finite("environment.strength", &[env.strength])?;
            if let Some(&bad) = env.layers.iter().find(|&&l| l >= self.n_layers) {
                return Err(AtlasError::Config(format!(
                    "environment layer {bad} out of range for {} layers",
                    self.n_layers
                )));
            }
        }

        if let Some(groups) = &self.groups {
            if groups.len() != self.n_nodes {
                return Err(AtlasError::Config(format!(
                    "groups must have {} labels, got {}",
                    self.n_nodes,
                    groups.len()
                )));
            }
        }
        Ok(())
    }

    /// α for layer `l`, 0.0 when adaptation is not configured.
    pub fn alpha_for(&self, l: usize) -> f64 {
        self.alpha.get(l).copied().unwrap_or(0.0)
    }
}

/// Initial phases and natural frequencies.
///
/// Explicit vectors win; otherwise values are drawn from a seeded RNG:
/// ω ~ N(omega_mean, omega_std), θ ~ U(−π, π).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub seed: u64,
    pub omega_mean: f64,
    pub omega_std: f64,
    /// L × N.
    pub omega: Option<Vec<Vec<f64>>>,
    /// L × N.
    pub theta: Option<Vec<Vec<f64>>>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            seed: 11,
            omega_mean: 0.0,
            omega_std: 0.25,
            omega: None,
            theta: None,
        }
    }
}

impl InitConfig {
    pub fn validate(&self, n_layers: usize, n_nodes: usize) -> AtlasResult<()> {
        ensure_finite("init.omega_mean/omega_std", &[self.omega_mean, self.omega_std])?;
        if self.omega_std < 0.0 {
            return Err(AtlasError::Config(format!(
                "init.omega_std must be >= 0, got {}",
                self.omega_std
            )));
        }
        if let Some(omega) = &self.omega {
            ensure_grid("init.omega", omega, n_layers, n_nodes)?;
        }
        if let Some(theta) = &self.theta {
            ensure_grid("init.theta", theta, n_layers, n_nodes)?;
        }
        Ok(())
    }
}

/// Parameters of the derived readiness / choice indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Readiness at or above this opens the choice gate.
    pub choice_threshold: f64,
    /// Clamp readiness to [0, 1]. Unclamped it is a raw linear combination.
    pub clamp_readiness: bool,
    /// Report drift per unit time (divide by dt) instead of per step.
    pub drift_per_unit_time: bool,
    /// Histogram bins for phase entropy.
    pub entropy_bins: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            choice_threshold: 0.72,
            clamp_readiness: true,
            drift_per_unit_time: false,
            entropy_bins: 36,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> AtlasResult<()> {
        if !self.choice_threshold.is_finite() {
            return Err(AtlasError::Config(format!(
                "choice_threshold must be finite, got {}",
                self.choice_threshold
            )));
        }
        if self.entropy_bins < 2 {
            return Err(AtlasError::Config(format!(
                "entropy_bins must be >= 2, got {}",
                self.entropy_bins
            )));
        }
        Ok(())
    }
}

/// Static run flags passed through to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFlags {
    /// Two reversible paths are offered.
    pub offer_two_paths: bool,
    pub consent_to_log: bool,
}

impl Default for RunFlags {
    fn default() -> Self {
        Self {
            offer_two_paths: true,
            consent_to_log: true,
        }
    }
}

/// Everything needed to construct one simulation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub name: String,
    pub field: FieldConfig,
    pub init: InitConfig,
    pub metrics: MetricsConfig,
    pub flags: RunFlags,
    /// Suggested run length. The core never enforces it.
    pub steps: u64,
}

impl RunConfig {
    pub fn validate(&self) -> AtlasResult<()> {
        self.field.validate()?;
        self.init
            .validate(self.field.n_layers, self.field.n_nodes)?;
        self.metrics.validate()
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> AtlasResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AtlasError::Config(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_layers() -> FieldConfig {
        FieldConfig {
            n_layers: 3,
            n_nodes: 16,
            intra_k: vec![0.5, 0.4, 0.3],
            inter_k: vec![vec![0.0; 3]; 3],
            ..FieldConfig::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(FieldConfig::default().validate().is_ok());
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let cfg = FieldConfig {
            n_nodes: 0,
            ..FieldConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AtlasError::Config(_))));
    }

    #[test]
    fn test_intra_k_length_mismatch_rejected() {
        let cfg = FieldConfig {
            intra_k: vec![0.5, 0.4],
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inter_k_not_square_rejected() {
        let cfg = FieldConfig {
            inter_k: vec![vec![0.0; 3], vec![0.0; 2], vec![0.0; 3]],
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_non_finite_parameters_rejected() {
        let mut cfg = three_layers();
        cfg.intra_k[1] = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = three_layers();
        cfg.inter_k[0][2] = f64::INFINITY;
        assert!(cfg.validate().is_err());

        let cfg = FieldConfig {
            dt: f64::NAN,
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_non_positive_dt_rejected() {
        let cfg = FieldConfig {
            dt: 0.0,
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_negative_coupling_allowed() {
        let cfg = FieldConfig {
            intra_k: vec![-0.5, 0.4, 0.3],
            ..three_layers()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_environment_layer_out_of_range() {
        let cfg = FieldConfig {
            environment: Some(EnvironmentConfig {
                strength: 0.2,
                layers: vec![3],
            }),
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_groups_length_checked() {
        let cfg = FieldConfig {
            groups: Some(vec![0; 15]),
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resource_initial_out_of_unit_interval() {
        let cfg = FieldConfig {
            resources: Some(ResourceConfig {
                initial: Some(vec![vec![1.5; 16]; 3]),
                ..ResourceConfig::default()
            }),
            ..three_layers()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_alpha_for_defaults_to_zero() {
        let cfg = three_layers();
        assert_eq!(cfg.alpha_for(2), 0.0);
        let cfg = FieldConfig {
            alpha: vec![0.0, 0.02, 0.0],
            ..three_layers()
        };
        assert_eq!(cfg.alpha_for(1), 0.02);
    }

    #[test]
    fn test_init_shape_checked() {
        let init = InitConfig {
            theta: Some(vec![vec![0.0; 16]; 2]),
            ..InitConfig::default()
        };
        assert!(init.validate(3, 16).is_err());
    }

    #[test]
    fn test_from_json_uses_defaults() {
        let cfg = RunConfig::from_json(
            r#"{"name": "tiny", "field": {"n_layers": 2, "n_nodes": 4,
                "intra_k": [1.0, 1.0], "inter_k": [[0.0, 0.1], [0.1, 0.0]]},
                "flags": {"offer_two_paths": false}}"#,
        )
        .unwrap();
        assert_eq!(cfg.name, "tiny");
        assert_eq!(cfg.field.dt, 0.01);
        assert_eq!(cfg.field.inter_layer_mode, InterLayerMode::Node);
        assert!(!cfg.flags.offer_two_paths);
        assert!(cfg.flags.consent_to_log);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_parse_error() {
        assert!(matches!(
            RunConfig::from_json("{not json"),
            Err(AtlasError::Config(_))
        ));
    }
}
