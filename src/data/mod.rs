// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a graph on disk (or a generator) and the
// tensors the encoder consumes.
//
//   graph.json / SBM generator
//       │
//       ▼
//   GraphData          → validated features, edges, labels
//       │
//       ▼
//   split_nodes        → train / validation node indices
//       │
//       ▼
//   GraphTensors       → [N, D] features + [N] labels on a device
//
// Reference: Burn Book §4 (Datasets)

/// Reads graphs from JSON files
pub mod loader;

/// Stochastic block model generator for demos and tests
pub mod synthetic;

/// Shuffles node ids into train/validation sets
pub mod splitter;

/// Converts GraphData into Burn tensors
pub mod tensors;
