// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn-specific model code. The domain
// layer never sees a tensor; the data layer only converts
// graphs into tensors.
//
// What's in this layer:
//
//   activation.rs — name → activation module (relu, gelu, prelu, elu)
//   norm.rs       — optional layer / batch normalisation
//   conv.rs       — GatConv: one multi-head graph attention layer,
//                   behind the AttentionConv trait
//   model.rs      — GatConfig (layer factory) and the Gat encoder:
//                   forward pass, hidden states, output head
//   trainer.rs    — fine-tuning loop (encoder → node classifier)
//   inferencer.rs — Embedder: encoder → per-node embeddings
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Veličković et al. (2018) Graph Attention Networks

/// Activation factory
pub mod activation;

/// Output normalisation
pub mod norm;

/// Graph attention convolution
pub mod conv;

/// GAT encoder and its layer factory
pub mod model;

/// Node-classification fine-tuning loop
pub mod trainer;

/// Embedding extraction
pub mod inferencer;
