// ============================================================
// Layer 5 — Embedder
// ============================================================
// Runs a GAT encoder over a whole graph and hands back plain
// Vec<f32> rows. The encoder comes either from a checkpoint
// (config + head + weights) or straight from a config with
// freshly initialised weights.
use anyhow::Result;
use burn::prelude::*;

use crate::data::tensors::GraphTensors;
use crate::domain::graph::GraphData;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Gat, GatConfig, HeadKind};

pub type InferBackend = burn::backend::NdArray;

/// Node embeddings for one graph.
#[derive(Debug, Clone)]
pub struct Embeddings {
    /// Last-layer output, one row per node
    pub embeddings: Vec<Vec<f32>>,
    /// Head output when the encoder carries a classifier
    pub logits:     Option<Vec<Vec<f32>>>,
    /// Every layer's output, present when requested
    pub hidden:     Option<Vec<Vec<Vec<f32>>>>,
}

pub struct Embedder<B: Backend = InferBackend> {
    model:  Gat<B>,
    device: B::Device,
}

impl<B: Backend> Embedder<B> {
    pub fn new(model: Gat<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn from_config(cfg: &GatConfig, device: B::Device) -> Self {
        let model = cfg.init(&device);
        Self::new(model, device)
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg       = ckpt_manager.load_config()?;
        let mut model = cfg.init::<B>(&device);
        if let HeadKind::Classifier { num_classes, .. } = ckpt_manager.load_head()? {
            model.reset_classifier(num_classes, &device);
        }
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Encoder loaded from checkpoint ({} layers)", model.num_layers());
        Ok(Self::new(model, device))
    }

    pub fn model(&self) -> &Gat<B> {
        &self.model
    }

    pub fn embed(&self, graph: &GraphData, return_hidden: bool) -> Result<Embeddings> {
        let tensors = GraphTensors::<B>::from_graph(graph, &self.device);
        let out     = self.model.forward_with_hidden(tensors.features.clone(), &tensors.edges);

        // With no layers the input features are the embeddings
        let last = out.hidden.last().cloned().unwrap_or(tensors.features);
        let logits = match self.model.head_kind() {
            HeadKind::Identity => None,
            HeadKind::Classifier { .. } => Some(to_rows(out.output)?),
        };
        let hidden = if return_hidden {
            Some(out.hidden.into_iter().map(to_rows).collect::<Result<Vec<_>>>()?)
        } else {
            None
        };

        Ok(Embeddings { embeddings: to_rows(last)?, logits, hidden })
    }
}

fn to_rows<B: Backend>(t: Tensor<B, 2>) -> Result<Vec<Vec<f32>>> {
    let [_, width] = t.dims();
    let flat: Vec<f32> = t
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))?;
    if width == 0 {
        return Ok(Vec::new());
    }
    Ok(flat.chunks(width).map(<[f32]>::to_vec).collect())
}
