// ============================================================
// Layer 5 — Output Normalisation
// ============================================================
// Optional normalisation applied to a GAT layer's output after
// the residual and bias, before the activation.
//
//   none        → passthrough
//   layer_norm  → normalise each node's feature row
//   batch_norm  → normalise each feature across nodes

use anyhow::{bail, Result};
use burn::{
    nn::{BatchNorm, BatchNormConfig, LayerNorm, LayerNormConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormKind {
    None,
    LayerNorm,
    BatchNorm,
}

impl NormKind {
    pub fn init<B: Backend>(&self, width: usize, device: &B::Device) -> Norm<B> {
        let (layer, batch) = match self {
            NormKind::None => (None, None),
            NormKind::LayerNorm => (Some(LayerNormConfig::new(width).init(device)), None),
            NormKind::BatchNorm => (None, Some(BatchNormConfig::new(width).init(device))),
        };
        Norm { layer, batch }
    }
}

impl FromStr for NormKind {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "none" | "" => NormKind::None,
            "layernorm" | "layer_norm" => NormKind::LayerNorm,
            "batchnorm" | "batch_norm" => NormKind::BatchNorm,
            other => bail!("Unknown norm '{other}' (expected none, layernorm or batchnorm)"),
        })
    }
}

impl fmt::Display for NormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormKind::None => "none",
            NormKind::LayerNorm => "layer_norm",
            NormKind::BatchNorm => "batch_norm",
        };
        f.write_str(name)
    }
}

#[derive(Module, Debug)]
pub struct Norm<B: Backend> {
    layer: Option<LayerNorm<B>>,
    batch: Option<BatchNorm<B, 0>>,
}

impl<B: Backend> Norm<B> {
    pub fn kind(&self) -> NormKind {
        match (&self.layer, &self.batch) {
            (Some(_), _) => NormKind::LayerNorm,
            (None, Some(_)) => NormKind::BatchNorm,
            (None, None) => NormKind::None,
        }
    }

    /// x: [num_nodes, width]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        if let Some(norm) = &self.layer {
            norm.forward(x)
        } else if let Some(norm) = &self.batch {
            norm.forward(x)
        } else {
            x
        }
    }
}
