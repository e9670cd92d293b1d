// ============================================================
// Layer 4 — JSON Graph Loader
// ============================================================
// File format:
//
//   {
//     "features": [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]],
//     "edges":    [[0, 1], [1, 2]],
//     "labels":   [0, 1, 1],          (optional)
//     "undirected": true              (optional, default false)
//   }
//
// The node count is the number of feature rows. When
// `undirected` is set, every edge is mirrored on load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::{edge_index::EdgeIndex, graph::GraphData, traits::GraphSource};

/// On-disk representation of a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    pub features: Vec<Vec<f32>>,
    pub edges:    Vec<[usize; 2]>,
    #[serde(default)]
    pub labels:   Option<Vec<usize>>,
    #[serde(default)]
    pub undirected: bool,
}

impl GraphFile {
    /// Validate and convert into the domain type.
    pub fn into_graph(self) -> Result<GraphData> {
        let num_nodes = self.features.len();
        let pairs: Vec<(usize, usize)> = self.edges.iter().map(|e| (e[0], e[1])).collect();
        let mut edges = EdgeIndex::from_pairs(num_nodes, &pairs)?;
        if self.undirected {
            edges = edges.to_undirected();
        }
        GraphData::try_new(self.features, edges, self.labels)
    }

    /// Snapshot a graph in file form (edges are written as stored).
    pub fn from_graph(graph: &GraphData) -> Self {
        Self {
            features:   graph.features.clone(),
            edges:      graph.edges.pairs().map(|(s, t)| [s, t]).collect(),
            labels:     graph.labels.clone(),
            undirected: false,
        }
    }
}

/// Loads a single graph from a JSON file.
pub struct JsonGraphLoader {
    path: PathBuf,
}

impl JsonGraphLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Write a graph to `path` as pretty JSON.
    pub fn save(graph: &GraphData, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&GraphFile::from_graph(graph))?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write graph to '{}'", path.display()))
    }
}

impl GraphSource for JsonGraphLoader {
    fn load_graph(&self) -> Result<GraphData> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read graph file '{}'", self.path.display()))?;
        let file: GraphFile = serde_json::from_str(&json)
            .with_context(|| format!("Malformed graph JSON in '{}'", self.path.display()))?;
        let graph = file
            .into_graph()
            .with_context(|| format!("Invalid graph in '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded graph '{}': {} nodes, {} edges, feature dim {}",
            self.path.display(),
            graph.num_nodes(),
            graph.edges.num_edges(),
            graph.feature_dim(),
        );
        if graph.edges.has_self_loops() {
            tracing::debug!("Graph has self-loops; those nodes attend to their own features");
        }
        Ok(graph)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_undirected_graph() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json");
        fs::write(
            &path,
            r#"{"features": [[1.0], [2.0], [3.0]], "edges": [[0, 1], [1, 2]], "undirected": true}"#,
        )
        .unwrap();

        let graph = JsonGraphLoader::new(&path).load_graph().unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.edges.num_edges(), 4);
        assert!(graph.labels.is_none());
    }

    #[test]
    fn test_bad_edge_is_reported_with_path() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"features": [[1.0]], "edges": [[0, 5]]}"#).unwrap();

        let err = JsonGraphLoader::new(&path).load_graph().unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn test_save_then_load_keeps_labels() {
        let dir   = tempfile::tempdir().unwrap();
        let path  = dir.path().join("out.json");
        let edges = EdgeIndex::from_pairs(2, &[(0, 1), (1, 0)]).unwrap();
        let graph = GraphData::try_new(vec![vec![0.5, 1.5]; 2], edges, Some(vec![1, 0])).unwrap();

        JsonGraphLoader::save(&graph, &path).unwrap();
        let back = JsonGraphLoader::new(&path).load_graph().unwrap();
        assert_eq!(back.labels, Some(vec![1, 0]));
        assert_eq!(back.edges, graph.edges);
    }
}
