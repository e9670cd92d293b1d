// ============================================================
// Layer 3 — GraphData Domain Type
// ============================================================
// One attributed graph: a feature row per node, the directed
// connectivity, and (for fine-tuning) an optional class label
// per node.
//
// Example:
//   3 nodes, 2 features each, edges 0→1 and 1→2
//   features = [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]
//   labels   = Some([0, 1, 1])

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::edge_index::EdgeIndex;

/// Node features, connectivity and optional labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    /// One row of `feature_dim` values per node
    pub features: Vec<Vec<f32>>,

    /// Directed edges (source → target)
    pub edges: EdgeIndex,

    /// Class label per node, required only for fine-tuning
    pub labels: Option<Vec<usize>>,
}

impl GraphData {
    /// Build a graph, checking that every table agrees on the node count
    /// and that all feature rows have the same width.
    pub fn try_new(
        features: Vec<Vec<f32>>,
        edges:    EdgeIndex,
        labels:   Option<Vec<usize>>,
    ) -> Result<Self> {
        if features.len() != edges.num_nodes() {
            bail!(
                "Graph has {} feature rows but the edge index declares {} nodes",
                features.len(),
                edges.num_nodes()
            );
        }
        let width = features.first().map(Vec::len).unwrap_or(0);
        if let Some(i) = features.iter().position(|row| row.len() != width) {
            bail!("Feature row {i} has width {} (expected {width})", features[i].len());
        }
        if let Some(l) = &labels {
            if l.len() != features.len() {
                bail!("Graph has {} labels for {} nodes", l.len(), features.len());
            }
        }
        Ok(Self { features, edges, labels })
    }

    pub fn num_nodes(&self) -> usize { self.features.len() }

    pub fn feature_dim(&self) -> usize {
        self.features.first().map(Vec::len).unwrap_or(0)
    }

    /// Number of classes implied by the labels (max label + 1).
    pub fn num_classes(&self) -> Option<usize> {
        self.labels
            .as_ref()
            .and_then(|l| l.iter().max())
            .map(|&m| m + 1)
    }

    /// Features flattened row-major, ready for a `[N, D]` tensor.
    pub fn flat_features(&self) -> Vec<f32> {
        self.features.iter().flatten().copied().collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn edges(n: usize) -> EdgeIndex {
        EdgeIndex::from_pairs(n, &[(0, 1)]).unwrap()
    }

    #[test]
    fn test_rejects_ragged_features() {
        let res = GraphData::try_new(vec![vec![1.0, 2.0], vec![3.0]], edges(2), None);
        assert!(res.is_err());
    }

    #[test]
    fn test_rejects_node_count_mismatch() {
        let res = GraphData::try_new(vec![vec![1.0]; 3], edges(2), None);
        assert!(res.is_err());
    }

    #[test]
    fn test_num_classes_from_labels() {
        let g = GraphData::try_new(vec![vec![0.0]; 2], edges(2), Some(vec![0, 4])).unwrap();
        assert_eq!(g.num_classes(), Some(5));
        assert_eq!(g.feature_dim(), 1);
        assert_eq!(g.flat_features(), vec![0.0, 0.0]);
    }
}
