// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   checkpoint.rs — Saving and loading encoder weights with
//                   Burn's CompactRecorder, plus the GatConfig
//                   and output-head description as JSON so the
//                   exact model can be rebuilt before loading.
//
//   metrics.rs    — Writes epoch-level fine-tuning metrics
//                   (loss, accuracy) to a CSV file.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Fine-tuning metrics CSV logger
pub mod metrics;
