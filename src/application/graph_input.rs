// ============================================================
// Layer 2 — Graph Input Selection
// ============================================================
// The use cases accept either a JSON file or generator
// settings; both resolve to a GraphSource.

use anyhow::Result;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::data::{loader::JsonGraphLoader, synthetic::SyntheticGraphConfig};
use crate::domain::{graph::GraphData, traits::GraphSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphInput {
    File(String),
    Synthetic(SyntheticGraphConfig),
}

impl Default for GraphInput {
    fn default() -> Self {
        GraphInput::Synthetic(SyntheticGraphConfig::default())
    }
}

impl GraphInput {
    pub fn source(&self) -> Box<dyn GraphSource> {
        match self {
            GraphInput::File(path) => Box::new(JsonGraphLoader::new(path)),
            GraphInput::Synthetic(cfg) => Box::new(cfg.clone()),
        }
    }
}

/// Load (or generate) a graph and write it out as graph JSON.
pub fn export_graph(input: &GraphInput, path: impl AsRef<Path>) -> Result<GraphData> {
    let graph = input.load_graph()?;
    JsonGraphLoader::save(&graph, &path)?;
    tracing::info!("Graph written to '{}'", path.as_ref().display());
    Ok(graph)
}

impl GraphSource for GraphInput {
    fn load_graph(&self) -> Result<GraphData> {
        self.source().load_graph()
    }
}
