// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads graphs through this trait, so a
// JSON file and the synthetic generator are interchangeable.
//
// Implementations:
//   - JsonGraphLoader      → reads a graph from a .json file
//   - SyntheticGraphConfig → samples a stochastic block model

use anyhow::Result;
use crate::domain::graph::GraphData;

/// Any component that can produce an attributed graph.
pub trait GraphSource {
    /// Load (or generate) the graph.
    fn load_graph(&self) -> Result<GraphData>;
}
