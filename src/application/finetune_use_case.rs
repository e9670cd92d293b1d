// ============================================================
// Layer 2 — FinetuneUseCase
// ============================================================
// Orchestrates node-classification fine-tuning in order:
//
//   Step 1: Load the graph                     (Layer 4 - data)
//   Step 2: Build the encoder config           (this layer)
//   Step 3: Save config + run settings         (Layer 6 - infra)
//   Step 4: Initialise the encoder, seeded     (Layer 5 - ml)
//   Step 5: Run the fine-tuning loop           (Layer 5 - ml)

use anyhow::{bail, Result};
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};

use crate::application::{graph_input::GraphInput, settings::ModelSettings};
use crate::domain::traits::GraphSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::trainer::{run_finetune, FinetuneReport, TrainBackend};

// ─── Fine-tuning Configuration ───────────────────────────────────────────────
// Saved as finetune_config.json next to the checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    pub graph:          GraphInput,
    pub checkpoint_dir: String,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   f64,
    /// Share of nodes whose labels drive the loss
    pub train_fraction: f64,
    pub seed:           u64,
    pub model:          ModelSettings,
}

impl Default for FinetuneConfig {
    fn default() -> Self {
        Self {
            graph:          GraphInput::default(),
            checkpoint_dir: "checkpoints".to_string(),
            epochs:         100,
            lr:             5e-3,
            weight_decay:   5e-4,
            train_fraction: 0.6,
            seed:           42,
            model:          ModelSettings::default(),
        }
    }
}

pub struct FinetuneUseCase {
    config: FinetuneConfig,
}

impl FinetuneUseCase {
    pub fn new(config: FinetuneConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<FinetuneReport> {
        let cfg = &self.config;
        if !(0.0..=1.0).contains(&cfg.train_fraction) {
            bail!("train_fraction must be within [0, 1], got {}", cfg.train_fraction);
        }

        let graph = cfg.graph.load_graph()?;
        if graph.labels.is_none() {
            bail!("The graph has no labels; fine-tuning needs one label per node");
        }

        let gat_cfg = cfg.model.to_gat_config(graph.feature_dim())?;

        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(&gat_cfg)?;
        ckpt_manager.write_json("finetune_config.json", cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        let device = Default::default();
        TrainBackend::seed(cfg.seed);
        let model = gat_cfg.init::<TrainBackend>(&device);
        tracing::info!("Encoder ready: {} layers, output width {}", model.num_layers(), model.output_width());

        let (_, report) = run_finetune(model, &graph, cfg, &ckpt_manager, &metrics, &device)?;
        tracing::info!(
            "Fine-tuning complete: best val_acc={:.1}% at epoch {}",
            report.best_val_acc * 100.0,
            report.best_epoch
        );
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::encode_use_case::{EncodeConfig, EncodeUseCase};
    use crate::data::synthetic::SyntheticGraphConfig;

    #[test]
    fn test_finetune_then_encode_from_checkpoint() {
        let dir   = tempfile::tempdir().unwrap();
        let graph = GraphInput::Synthetic(SyntheticGraphConfig {
            num_nodes: 40,
            num_classes: 3,
            feature_dim: 6,
            ..Default::default()
        });
        let model = ModelSettings { num_hidden: 8, out_dim: 8, nhead: 2, ..Default::default() };

        let cfg = FinetuneConfig {
            graph:          graph.clone(),
            checkpoint_dir: dir.path().to_string_lossy().into_owned(),
            epochs:         3,
            model:          model.clone(),
            ..Default::default()
        };
        let report = FinetuneUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.history.len(), 3);
        assert_eq!(report.num_classes, 3);
        assert!(dir.path().join("finetune_config.json").exists());
        assert!(dir.path().join("metrics.csv").exists());

        let enc = EncodeConfig {
            graph,
            checkpoint_dir: Some(dir.path().to_string_lossy().into_owned()),
            model,
            ..Default::default()
        };
        let file = EncodeUseCase::new(enc).execute().unwrap();
        assert_eq!(file.width, 8);
        assert_eq!(file.logits.unwrap()[0].len(), 3);
    }

    #[test]
    fn test_rejects_bad_train_fraction() {
        let cfg = FinetuneConfig { train_fraction: 1.5, ..Default::default() };
        assert!(FinetuneUseCase::new(cfg).execute().is_err());
    }
}
