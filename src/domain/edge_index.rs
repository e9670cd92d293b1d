// ============================================================
// Layer 3 — EdgeIndex Domain Type
// ============================================================
// A directed edge list in coordinate format:
//
//   sources[k] → targets[k]
//
// Messages flow from source to target, so node i aggregates
// over every j with an edge j → i. Self-loops are never added
// implicitly; a node only attends to itself if the caller put
// the edge i → i in the list.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Validated directed connectivity of a graph with `num_nodes` nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeIndex {
    num_nodes: usize,
    sources:   Vec<usize>,
    targets:   Vec<usize>,
}

impl EdgeIndex {
    /// Build an edge index, rejecting out-of-range node ids and
    /// mismatched list lengths.
    pub fn try_new(num_nodes: usize, sources: Vec<usize>, targets: Vec<usize>) -> Result<Self> {
        if sources.len() != targets.len() {
            bail!(
                "Edge list length mismatch: {} sources vs {} targets",
                sources.len(),
                targets.len()
            );
        }
        if let Some((k, (&s, &t))) = sources
            .iter()
            .zip(targets.iter())
            .enumerate()
            .find(|(_, (&s, &t))| s >= num_nodes || t >= num_nodes)
        {
            bail!("Edge {k} ({s} -> {t}) references a node outside 0..{num_nodes}");
        }
        Ok(Self { num_nodes, sources, targets })
    }

    /// Build from `(source, target)` pairs.
    pub fn from_pairs(num_nodes: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let (sources, targets) = pairs.iter().copied().unzip();
        Self::try_new(num_nodes, sources, targets)
    }

    /// Returns a copy with the reverse of every edge added.
    /// Edges that already exist in both directions are not duplicated.
    pub fn to_undirected(&self) -> Self {
        let mut pairs: Vec<(usize, usize)> = self.pairs().collect();
        pairs.extend(self.pairs().map(|(s, t)| (t, s)));
        pairs.sort_unstable();
        pairs.dedup();
        let (sources, targets) = pairs.into_iter().unzip();
        Self { num_nodes: self.num_nodes, sources, targets }
    }

    pub fn num_nodes(&self) -> usize { self.num_nodes }

    pub fn num_edges(&self) -> usize { self.sources.len() }

    /// Iterate over `(source, target)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sources.iter().copied().zip(self.targets.iter().copied())
    }

    pub fn has_self_loops(&self) -> bool {
        self.pairs().any(|(s, t)| s == t)
    }

    /// Row-major `[target, source]` adjacency, `true` where an edge exists.
    pub fn dense_adjacency(&self) -> Vec<bool> {
        let n = self.num_nodes;
        let mut adj = vec![false; n * n];
        for (s, t) in self.pairs() {
            adj[t * n + s] = true;
        }
        adj
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_node() {
        let err = EdgeIndex::from_pairs(3, &[(0, 1), (1, 3)]).unwrap_err();
        assert!(err.to_string().contains("outside 0..3"));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        assert!(EdgeIndex::try_new(4, vec![0, 1], vec![2]).is_err());
    }

    #[test]
    fn test_dense_adjacency_is_target_major() {
        let edges = EdgeIndex::from_pairs(2, &[(0, 1)]).unwrap();
        // row = target 1, column = source 0
        assert_eq!(edges.dense_adjacency(), vec![false, false, true, false]);
    }

    #[test]
    fn test_to_undirected_adds_reverse_once() {
        let edges = EdgeIndex::from_pairs(3, &[(0, 1), (1, 0), (1, 2)]).unwrap();
        let und   = edges.to_undirected();
        assert_eq!(und.num_edges(), 4);
        assert!(und.pairs().any(|p| p == (2, 1)));
        assert!(!und.has_self_loops());
    }
}
