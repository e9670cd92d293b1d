// ============================================================
// Layer 5 — Fine-tuning Loop
// ============================================================
// Repurposes a GAT encoder as a node classifier:
//
//   1. reset_classifier(num_classes)    → linear head on top
//   2. full-graph forward every epoch   → logits for all nodes
//   3. cross-entropy on training nodes  → Adam update
//   4. model.valid() on validation nodes (no dropout, no autodiff)
//   5. metrics row + checkpoint per epoch
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend
//   - model.valid() returns the model on B::InnerBackend
//   - Evaluation tensors must be built on the inner backend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::finetune_use_case::FinetuneConfig;
use crate::data::{
    splitter::split_nodes,
    tensors::{node_index, GraphTensors},
};
use crate::domain::graph::GraphData;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::conv::Adjacency;
use crate::ml::model::Gat;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Summary of a finished fine-tuning run.
#[derive(Debug, Clone)]
pub struct FinetuneReport {
    pub epochs:       usize,
    pub num_classes:  usize,
    pub best_val_acc: f64,
    pub best_epoch:   usize,
    pub history:      Vec<EpochMetrics>,
}

pub fn run_finetune<B: AutodiffBackend>(
    mut model:    Gat<B>,
    graph:        &GraphData,
    cfg:          &FinetuneConfig,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       &B::Device,
) -> Result<(Gat<B>, FinetuneReport)> {
    let Some(num_classes) = graph.num_classes() else {
        bail!("Fine-tuning needs node labels but the graph has none");
    };
    model.reset_classifier(num_classes, device);
    ckpt_manager.save_head(&model.head_kind())?;

    // ── Graph tensors on both backends ────────────────────────────────────────
    let train_graph = GraphTensors::<B>::from_graph(graph, device);
    let eval_graph  = GraphTensors::<B::InnerBackend>::from_graph(graph, device);
    let train_adj   = Adjacency::<B>::from_edges(&graph.edges, device);
    let eval_adj    = Adjacency::<B::InnerBackend>::from_edges(&graph.edges, device);

    let (train_ids, val_ids) = split_nodes(graph.num_nodes(), cfg.train_fraction, cfg.seed);
    if train_ids.is_empty() {
        bail!("Training split is empty (train_fraction={})", cfg.train_fraction);
    }
    tracing::info!("Fine-tuning on {} nodes, validating on {}", train_ids.len(), val_ids.len());

    let train_idx     = node_index::<B>(&train_ids, device);
    let train_targets = train_graph
        .labels
        .clone()
        .map(|l| l.select(0, train_idx.clone()))
        .ok_or_else(|| anyhow::anyhow!("Labels missing after conversion"))?;
    let eval_labels = eval_graph
        .labels
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Labels missing after conversion"))?;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(cfg.weight_decay as f32)))
        .init();

    let ce          = CrossEntropyLossConfig::new().init(device);
    let mut history = Vec::with_capacity(cfg.epochs);
    let mut best    = (0.0f64, 0usize);

    for epoch in 1..=cfg.epochs {
        // ── Training step (one full-graph batch) ──────────────────────────────
        let logits = model.forward_adjacency(train_graph.features.clone(), &train_adj);
        let loss   = ce.forward(logits.select(0, train_idx.clone()), train_targets.clone());
        let train_loss: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model     = optim.step(cfg.lr, model, grads);

        // ── Evaluation (dropout disabled) ─────────────────────────────────────
        let model_valid = model.valid();
        let logits      = model_valid.forward_adjacency(eval_graph.features.clone(), &eval_adj);
        let train_eval  = evaluate(logits.clone(), eval_labels.clone(), &train_ids, device);
        let val_eval    = evaluate(logits, eval_labels.clone(), &val_ids, device);

        let m = EpochMetrics::new(
            epoch,
            train_loss,
            train_eval.accuracy,
            val_eval.loss,
            val_eval.accuracy,
        );
        if epoch == 1 || m.is_improvement(best.0) {
            best = (m.val_acc, epoch);
        }

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, m.train_loss, m.train_acc * 100.0, m.val_loss, m.val_acc * 100.0,
        );

        metrics.log(&m)?;
        ckpt_manager.save_model(&model, epoch)?;
        history.push(m);
    }

    let report = FinetuneReport {
        epochs: cfg.epochs,
        num_classes,
        best_val_acc: best.0,
        best_epoch: best.1,
        history,
    };
    Ok((model, report))
}

/// Loss and accuracy over a subset of nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeEval {
    pub loss:     f64,
    pub accuracy: f64,
}

pub fn evaluate<B: Backend>(
    logits: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
    ids:    &[usize],
    device: &B::Device,
) -> NodeEval {
    if ids.is_empty() {
        return NodeEval { loss: f64::NAN, accuracy: 0.0 };
    }
    let idx     = node_index::<B>(ids, device);
    let logits  = logits.select(0, idx.clone());
    let targets = labels.select(0, idx);

    let loss: f64 = CrossEntropyLossConfig::new()
        .init(device)
        .forward(logits.clone(), targets.clone())
        .into_scalar()
        .elem::<f64>();

    // argmax(1) returns [n, 1] — flatten to [n] before comparing
    let correct: i64 = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();

    NodeEval { loss, accuracy: correct as f64 / ids.len() as f64 }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticGraphConfig;
    use crate::ml::model::{GatConfig, HeadKind};

    #[test]
    fn test_evaluate_counts_correct_argmax() {
        type B = burn::backend::NdArray;
        let device = Default::default();
        let logits = Tensor::<B, 2>::from_floats([[2.0, 0.0], [0.0, 3.0], [5.0, 1.0]], &device);
        let labels = Tensor::<B, 1, Int>::from_ints([0, 1, 1], &device);

        let all = evaluate(logits.clone(), labels.clone(), &[0, 1, 2], &device);
        assert!((all.accuracy - 2.0 / 3.0).abs() < 1e-9);

        let first_two = evaluate(logits, labels, &[0, 1], &device);
        assert_eq!(first_two.accuracy, 1.0);
        assert!(first_two.loss > 0.0);
    }

    #[test]
    fn test_evaluate_empty_subset() {
        type B = burn::backend::NdArray;
        let device = Default::default();
        let logits = Tensor::<B, 2>::zeros([2, 2], &device);
        let labels = Tensor::<B, 1, Int>::zeros([2], &device);
        assert_eq!(evaluate(logits, labels, &[], &device).accuracy, 0.0);
    }

    #[test]
    fn test_finetune_learns_separable_sbm() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let graph  = SyntheticGraphConfig {
            num_nodes: 60,
            num_classes: 2,
            feature_dim: 8,
            noise: 0.3,
            ..Default::default()
        }
        .generate()
        .unwrap();

        let model_cfg = GatConfig::new(8, 8, 8, 2, 2, 1).with_feat_drop(0.0).with_attn_drop(0.0);
        let model     = model_cfg.init::<TrainBackend>(&device);
        let cfg = FinetuneConfig {
            epochs: 30,
            lr: 0.01,
            checkpoint_dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let ckpt    = CheckpointManager::new(&cfg.checkpoint_dir);
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir).unwrap();

        let (model, report) = run_finetune(model, &graph, &cfg, &ckpt, &metrics, &device).unwrap();

        assert_eq!(report.history.len(), 30);
        assert_eq!(report.num_classes, 2);
        assert!(matches!(model.head_kind(), HeadKind::Classifier { num_classes: 2, .. }));

        let first = report.history.first().unwrap().train_loss;
        let last  = report.history.last().unwrap().train_loss;
        assert!(last < first, "loss did not decrease: {first} -> {last}");
        assert!(report.history.last().unwrap().train_acc > 0.75);
        assert!(dir.path().join("model_epoch_30.mpk.gz").exists());
    }

    #[test]
    fn test_finetune_without_labels_fails() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let mut graph = SyntheticGraphConfig { num_nodes: 10, ..Default::default() }.generate().unwrap();
        graph.labels  = None;

        let model   = GatConfig::new(16, 4, 4, 1, 1, 1).init::<TrainBackend>(&device);
        let ckpt    = CheckpointManager::new(dir.path().to_string_lossy());
        let metrics = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        let res     = run_finetune(model, &graph, &FinetuneConfig::default(), &ckpt, &metrics, &device);
        assert!(res.is_err());
    }
}
