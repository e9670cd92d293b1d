// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that describe a graph as the
// rest of the system sees it.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// The ML layer turns these types into tensors; the data layer
// produces them from JSON files or a synthetic generator.

// Directed edge list with validated node indices
pub mod edge_index;

// Node features, connectivity and optional labels
pub mod graph;

// Core abstractions (traits) that other layers implement
pub mod traits;
