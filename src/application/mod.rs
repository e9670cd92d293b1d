// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Encoder hyperparameters as the user supplies them
pub mod settings;

// Where the graph comes from (file or generator)
pub mod graph_input;

// Describe the layer plan of a configuration
pub mod inspect_use_case;

// Graph → node embeddings
pub mod encode_use_case;

// Encoder → node classifier
pub mod finetune_use_case;
