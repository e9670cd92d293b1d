// ============================================================
// Layer 4 — Train/Validation Node Splitter
// ============================================================
// Fine-tuning runs on the whole graph at once (every node sees
// its full neighbourhood), so instead of splitting samples we
// split NODE IDS: the loss is computed on training nodes and
// accuracy is reported on validation nodes.
//
// The shuffle is seeded so the same split is reproduced when
// a run is resumed or compared.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `0..num_nodes` and return `(train_ids, val_ids)`.
/// `train_fraction` of the nodes (rounded) go to training.
pub fn split_nodes(num_nodes: usize, train_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut ids: Vec<usize> = (0..num_nodes).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    // Clamp to valid range to avoid panics on tiny graphs
    let split_at = ((num_nodes as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(num_nodes);
    let val      = ids.split_off(split_at);

    tracing::debug!("Node split: {} training, {} validation", ids.len(), val.len());

    (ids, val)
}
