// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Named Presets
// ─────────────────────────────────────────────────────────────────────
//! Built-in run configurations and their layer topologies.
//!
//! A preset is plain `RunConfig` data. Layer topology enters only
//! through the inter-layer matrix γ = coupling · A, where A is the
//! adjacency of the layer graph:
//!
//!   - `lattice`: 2×3 rectangular grid of six layers, 4-neighbour.
//!   - `petal`:   seven layers, centre 0 joined to petals 1..=6, petals
//!                joined in a ring.

use std::collections::BTreeMap;

use atlas_types::{
    AtlasError, AtlasResult, EnvironmentConfig, FieldConfig, InitConfig, MetricsConfig,
    ResourceConfig, RunConfig, RunFlags,
};

pub const PRESET_NAMES: [&str; 2] = ["lattice", "petal"];

const LATTICE_ROWS: usize = 2;
const LATTICE_COLS: usize = 3;
const LATTICE_NODES: usize = 16;
const LATTICE_INTRA_K: f64 = 0.6;
const LATTICE_INTER_K: f64 = 0.2;

const PETAL_COUNT: usize = 6;
const PETAL_NODES: usize = 12;
const PETAL_INTRA_K: f64 = 1.2;
const PETAL_INTER_K: f64 = 0.4;
const PETAL_ALPHA: f64 = 0.01;

/// Rectangular grid adjacency, rows × cols cells in row-major order.
///
/// 4-neighbour by default, 8-neighbour with `diagonal`.
pub fn adjacency_grid(rows: usize, cols: usize, diagonal: bool) -> Vec<Vec<f64>> {
    const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

    let n = rows * cols;
    let mut a = vec![vec![0.0; n]; n];
    let offsets = ORTHOGONAL
        .iter()
        .chain(DIAGONAL.iter().filter(|_| diagonal));
    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            for &(dr, dc) in offsets.clone() {
                let (Some(rr), Some(cc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if rr < rows && cc < cols {
                    let j = rr * cols + cc;
                    a[i][j] = 1.0;
                    a[j][i] = 1.0;
                }
            }
        }
    }
    a
}

/// Centre-and-ring adjacency: node 0 is the centre, nodes 1..=6 the petals.
pub fn adjacency_petal() -> Vec<Vec<f64>> {
    let n = PETAL_COUNT + 1;
    let mut a = vec![vec![0.0; n]; n];
    for i in 1..n {
        a[0][i] = 1.0;
        a[i][0] = 1.0;
        let j = 1 + (i % PETAL_COUNT);
        a[i][j] = 1.0;
        a[j][i] = 1.0;
    }
    a
}

fn scaled(adjacency: Vec<Vec<f64>>, coupling: f64) -> Vec<Vec<f64>> {
    adjacency
        .into_iter()
        .map(|row| row.into_iter().map(|a| a * coupling).collect())
        .collect()
}

/// Six layers on a grid with resource-limited coupling. Only one path
/// is on offer, so the choice gate stays closed.
pub fn lattice_preset() -> RunConfig {
    let n_layers = LATTICE_ROWS * LATTICE_COLS;
    RunConfig {
        name: "lattice".to_string(),
        field: FieldConfig {
            n_layers,
            n_nodes: LATTICE_NODES,
            intra_k: vec![LATTICE_INTRA_K; n_layers],
            inter_k: scaled(
                adjacency_grid(LATTICE_ROWS, LATTICE_COLS, false),
                LATTICE_INTER_K,
            ),
            dt: 0.05,
            resources: Some(ResourceConfig::default()),
            ..FieldConfig::default()
        },
        init: InitConfig {
            seed: 11,
            omega_std: 0.25,
            ..InitConfig::default()
        },
        metrics: MetricsConfig::default(),
        flags: RunFlags {
            offer_two_paths: false,
            consent_to_log: true,
        },
        steps: 400,
    }
}

/// Centre plus six petals, strongly coupled, with slow frequency
/// adaptation and the centre entrained by the environment.
pub fn petal_preset() -> RunConfig {
    let n_layers = PETAL_COUNT + 1;
    RunConfig {
        name: "petal".to_string(),
        field: FieldConfig {
            n_layers,
            n_nodes: PETAL_NODES,
            intra_k: vec![PETAL_INTRA_K; n_layers],
            inter_k: scaled(adjacency_petal(), PETAL_INTER_K),
            dt: 0.05,
            alpha: vec![PETAL_ALPHA; n_layers],
            environment: Some(EnvironmentConfig {
                strength: 0.2,
                layers: vec![0],
            }),
            ..FieldConfig::default()
        },
        init: InitConfig {
            seed: 7,
            omega_std: 0.1,
            ..InitConfig::default()
        },
        metrics: MetricsConfig::default(),
        flags: RunFlags {
            offer_two_paths: true,
            consent_to_log: true,
        },
        steps: 400,
    }
}

/// Look up a built-in preset by name.
pub fn preset(name: &str) -> Option<RunConfig> {
    match name {
        "lattice" => Some(lattice_preset()),
        "petal" => Some(petal_preset()),
        _ => None,
    }
}

/// Like [`preset`], but an unknown name is an error.
pub fn require_preset(name: &str) -> AtlasResult<RunConfig> {
    preset(name).ok_or_else(|| {
        AtlasError::Preset(format!(
            "unknown preset '{name}', expected one of {PRESET_NAMES:?}"
        ))
    })
}

/// Parse a JSON object of named presets and validate each one.
///
/// An entry whose `name` is empty takes the key as its name.
pub fn presets_from_json(json: &str) -> AtlasResult<BTreeMap<String, RunConfig>> {
    let mut presets: BTreeMap<String, RunConfig> = serde_json::from_str(json)
        .map_err(|e| AtlasError::Preset(format!("JSON parse error: {e}")))?;
    for (key, cfg) in presets.iter_mut() {
        if cfg.name.is_empty() {
            cfg.name = key.clone();
        }
        cfg.validate()
            .map_err(|e| AtlasError::Preset(format!("preset '{key}': {e}")))?;
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_zero_diagonal(a: &[Vec<f64>]) -> bool {
        (0..a.len()).all(|i| a[i][i] == 0.0 && (0..a.len()).all(|j| a[i][j] == a[j][i]))
    }

    #[test]
    fn test_grid_adjacency_degrees() {
        let a = adjacency_grid(2, 3, false);
        assert!(symmetric_zero_diagonal(&a));
        let degree: Vec<f64> = a.iter().map(|row| row.iter().sum()).collect();
        // Corners touch 2 cells, edge middles 3.
        assert_eq!(degree, vec![2.0, 3.0, 2.0, 2.0, 3.0, 2.0]);
    }

    #[test]
    fn test_grid_adjacency_diagonal() {
        let a = adjacency_grid(3, 3, true);
        assert!(symmetric_zero_diagonal(&a));
        let centre: f64 = a[4].iter().sum();
        assert_eq!(centre, 8.0);
        let corner: f64 = a[0].iter().sum();
        assert_eq!(corner, 3.0);
    }

    #[test]
    fn test_petal_adjacency() {
        let a = adjacency_petal();
        assert_eq!(a.len(), 7);
        assert!(symmetric_zero_diagonal(&a));
        assert_eq!(a[0].iter().sum::<f64>(), 6.0);
        for petal in 1..7 {
            assert_eq!(a[petal].iter().sum::<f64>(), 3.0, "petal {petal}");
        }
        assert_eq!(a[6][1], 1.0, "ring closes");
    }

    #[test]
    fn test_builtin_presets_validate() {
        for name in PRESET_NAMES {
            let cfg = preset(name).unwrap();
            assert_eq!(cfg.name, name);
            cfg.validate().unwrap();
        }
        assert_eq!(lattice_preset().field.n_layers, 6);
        assert_eq!(petal_preset().field.n_layers, 7);
        assert!(!lattice_preset().flags.offer_two_paths);
        assert!(petal_preset().flags.offer_two_paths);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(preset("spiral").is_none());
        assert!(matches!(require_preset("spiral"), Err(AtlasError::Preset(_))));
    }

    #[test]
    fn test_presets_from_json() {
        let json = r#"{
            "pair": {
                "field": {
                    "n_layers": 2,
                    "n_nodes": 8,
                    "intra_k": [0.5, 0.5],
                    "inter_k": [[0.0, 0.1], [0.1, 0.0]],
                    "inter_layer_mode": "mean_field"
                },
                "flags": { "offer_two_paths": false }
            }
        }"#;
        let presets = presets_from_json(json).unwrap();
        let pair = &presets["pair"];
        assert_eq!(pair.name, "pair");
        assert_eq!(pair.field.n_nodes, 8);
        assert!(!pair.flags.offer_two_paths);
        assert!(pair.flags.consent_to_log);
    }

    #[test]
    fn test_presets_from_json_rejects_invalid() {
        assert!(matches!(
            presets_from_json("not json"),
            Err(AtlasError::Preset(_))
        ));
        let bad = r#"{ "bad": { "field": { "n_layers": 2, "intra_k": [0.5] } } }"#;
        assert!(matches!(presets_from_json(bad), Err(AtlasError::Preset(_))));
    }
}
