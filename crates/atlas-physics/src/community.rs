// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Local Coherence
// ─────────────────────────────────────────────────────────────────────
//! Per-node "local" order parameter feeding adaptation and resources.
//!
//! Local means the node's group inside its own layer when group labels
//! are configured, and the whole layer otherwise.

use std::collections::BTreeMap;

use crate::phase::{order_parameter, phasor_sums, OrderParameter};

/// Neighbourhood definition shared by every layer of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalScope {
    /// Whole-layer mean field.
    Layer,
    /// Group membership; `members[g]` lists the nodes of dense group `g`.
    Groups {
        members: Vec<Vec<usize>>,
        group_of: Vec<usize>,
    },
}

impl LocalScope {
    /// Build from optional per-node labels. Labels need not be contiguous.
    pub fn from_labels(labels: Option<&[usize]>) -> Self {
        let Some(labels) = labels else {
            return Self::Layer;
        };
        let mut dense: BTreeMap<usize, usize> = BTreeMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut group_of = Vec::with_capacity(labels.len());
        for (node, label) in labels.iter().enumerate() {
            let g = *dense.entry(*label).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[g].push(node);
            group_of.push(g);
        }
        Self::Groups { members, group_of }
    }

    pub fn n_groups(&self) -> usize {
        match self {
            Self::Layer => 1,
            Self::Groups { members, .. } => members.len(),
        }
    }

    /// Fill `out[i]` with the local order parameter of node i.
    pub fn local_order(&self, theta: &[f64], out: &mut Vec<OrderParameter>) {
        out.clear();
        match self {
            Self::Layer => {
                let op = order_parameter(theta);
                out.resize(theta.len(), op);
            }
            Self::Groups { members, group_of } => {
                let per_group: Vec<OrderParameter> = members
                    .iter()
                    .map(|nodes| {
                        let (c, s, n) = phasor_sums(nodes.iter().map(|&i| theta[i]));
                        let n = n.max(1) as f64;
                        OrderParameter::from_mean(c / n, s / n)
                    })
                    .collect();
                out.extend(group_of.iter().map(|&g| per_group[g]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_layer_scope_uses_global_mean() {
        let theta = [0.0, 0.0, PI / 2.0];
        let mut out = Vec::new();
        LocalScope::Layer.local_order(&theta, &mut out);
        assert_eq!(out.len(), 3);
        let global = order_parameter(&theta);
        assert!(out.iter().all(|op| *op == global));
    }

    #[test]
    fn test_group_scope_separates_clusters() {
        // Two tight clusters, antiphase to each other.
        let theta = [0.1, PI - 0.1, 0.1, PI - 0.1];
        let labels = [7, 3, 7, 3];
        let scope = LocalScope::from_labels(Some(&labels));
        assert_eq!(scope.n_groups(), 2);

        let mut out = Vec::new();
        scope.local_order(&theta, &mut out);
        assert!(out.iter().all(|op| (op.r - 1.0).abs() < 1e-12));
        assert!((out[0].psi - 0.1).abs() < 1e-12);
        assert!((out[1].psi - (PI - 0.1)).abs() < 1e-12);

        // Whole-layer view sees them cancel.
        assert!(order_parameter(&theta).r < 0.25);
    }

    #[test]
    fn test_no_labels_is_layer_scope() {
        assert_eq!(LocalScope::from_labels(None), LocalScope::Layer);
    }
}
