// ============================================================
// Layer 2 — EncodeUseCase
// ============================================================
// Graph in, node embeddings out:
//
//   Step 1: Load the graph                     (Layer 4 - data)
//   Step 2: Rebuild the encoder                (Layer 6 / Layer 5)
//           - from checkpoint_dir when given (it must
//             hold a saved encoder)
//           - otherwise from settings, seeded
//   Step 3: Run the encoder over the graph     (Layer 5 - ml)
//   Step 4: Optionally write embeddings JSON   (this layer)

use anyhow::{bail, Context, Result};
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::application::{graph_input::GraphInput, settings::ModelSettings};
use crate::domain::traits::GraphSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    conv::AttentionConv,
    inferencer::{Embedder, Embeddings, InferBackend},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    pub graph:          GraphInput,
    /// Load the encoder from here when it holds a checkpoint
    pub checkpoint_dir: Option<String>,
    /// Where to write the embeddings JSON
    pub output:         Option<String>,
    pub return_hidden:  bool,
    pub seed:           u64,
    pub model:          ModelSettings,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            graph:          GraphInput::default(),
            checkpoint_dir: None,
            output:         None,
            return_hidden:  false,
            seed:           42,
            model:          ModelSettings::default(),
        }
    }
}

/// Embeddings file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingFile {
    pub num_nodes:  usize,
    pub width:      usize,
    pub embeddings: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logits:     Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden:     Option<Vec<Vec<Vec<f32>>>>,
}

impl From<Embeddings> for EmbeddingFile {
    fn from(e: Embeddings) -> Self {
        Self {
            num_nodes:  e.embeddings.len(),
            width:      e.embeddings.first().map(Vec::len).unwrap_or(0),
            embeddings: e.embeddings,
            logits:     e.logits,
            hidden:     e.hidden,
        }
    }
}

pub struct EncodeUseCase {
    config: EncodeConfig,
}

impl EncodeUseCase {
    pub fn new(config: EncodeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EmbeddingFile> {
        let cfg   = &self.config;
        let graph = cfg.graph.load_graph()?;

        let device   = Default::default();
        let embedder = match &cfg.checkpoint_dir {
            Some(dir) => {
                let ckpt_manager = CheckpointManager::open(dir)?;
                tracing::info!("Using encoder checkpoint in '{}'", dir);
                Embedder::<InferBackend>::from_checkpoint(&ckpt_manager, device)?
            }
            None => {
                tracing::info!("No checkpoint given; using a freshly initialised encoder (seed {})", cfg.seed);
                InferBackend::seed(cfg.seed);
                let gat_cfg = cfg.model.to_gat_config(graph.feature_dim())?;
                Embedder::from_config(&gat_cfg, device)
            }
        };

        if let Some(first) = embedder.model().layers().first() {
            if first.in_width() != graph.feature_dim() {
                bail!(
                    "Encoder expects {} input features but the graph has {}",
                    first.in_width(),
                    graph.feature_dim()
                );
            }
        }

        let file: EmbeddingFile = embedder.embed(&graph, cfg.return_hidden)?.into();
        tracing::info!("Encoded {} nodes into {}-d embeddings", file.num_nodes, file.width);

        if let Some(path) = &cfg.output {
            let json = serde_json::to_string(&file)?;
            fs::write(path, json).with_context(|| format!("Cannot write embeddings to '{path}'"))?;
            tracing::info!("Embeddings written to '{}'", path);
        }

        Ok(file)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticGraphConfig;
    use crate::ml::model::GatConfig;

    fn synthetic(feature_dim: usize) -> GraphInput {
        GraphInput::Synthetic(SyntheticGraphConfig { num_nodes: 15, feature_dim, ..Default::default() })
    }

    #[test]
    fn test_encode_fresh_encoder_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("emb.json");
        let cfg = EncodeConfig {
            graph:         synthetic(6),
            output:        Some(out.to_string_lossy().into_owned()),
            return_hidden: true,
            model:         ModelSettings { out_dim: 5, ..Default::default() },
            ..Default::default()
        };

        let file = EncodeUseCase::new(cfg).execute().unwrap();
        assert_eq!(file.num_nodes, 15);
        assert_eq!(file.width, 5);
        assert_eq!(file.hidden.as_ref().unwrap().len(), 2);

        let back: EmbeddingFile = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(back.embeddings.len(), 15);
        assert!(back.logits.is_none());
    }

    #[test]
    fn test_encode_fails_when_checkpoint_dir_is_empty() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_run");
        let out     = dir.path().join("emb.json");
        let cfg = EncodeConfig {
            graph:          synthetic(6),
            checkpoint_dir: Some(missing.to_string_lossy().into_owned()),
            output:         Some(out.to_string_lossy().into_owned()),
            ..Default::default()
        };

        let err = EncodeUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("No encoder checkpoint"));
        assert!(!missing.exists());
        assert!(!out.exists());

        // An existing directory without a saved config is rejected too
        let cfg = EncodeConfig {
            graph:          synthetic(6),
            checkpoint_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        assert!(EncodeUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_encode_rejects_width_mismatch_with_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_string_lossy());
        let gat  = GatConfig::new(9, 4, 4, 1, 1, 1);
        ckpt.save_config(&gat).unwrap();
        ckpt.save_model(&gat.init::<InferBackend>(&Default::default()), 1).unwrap();

        let cfg = EncodeConfig {
            graph:          synthetic(6),
            checkpoint_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let err = EncodeUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("expects 9 input features"));
    }
}
