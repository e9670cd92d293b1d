// ============================================================
// Layer 5 — Activation Factory
// ============================================================
// Maps an activation name to a Burn module. Most activations
// are stateless; PReLU carries a learnable slope, so every
// activation is wrapped in a Module that may own parameters.
//
//   "relu"     → max(0, x)
//   "gelu"     → Gaussian error linear unit
//   "prelu"    → max(0, x) + a * min(0, x), `a` learned
//   "elu"      → x if x > 0 else exp(x) - 1
//   "identity" → x   (also accepted: "none", "")

use anyhow::{bail, Result};
use burn::{
    module::Ignored,
    nn::{PRelu, PReluConfig},
    prelude::*,
    tensor::activation,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Relu,
    Gelu,
    Prelu,
    Elu,
    Identity,
}

impl ActivationKind {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Activation<B> {
        let prelu = match self {
            ActivationKind::Prelu => Some(PReluConfig::new().init(device)),
            _ => None,
        };
        Activation { kind: Ignored(*self), prelu }
    }
}

impl FromStr for ActivationKind {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "relu" => ActivationKind::Relu,
            "gelu" => ActivationKind::Gelu,
            "prelu" => ActivationKind::Prelu,
            "elu" => ActivationKind::Elu,
            "identity" | "none" | "" => ActivationKind::Identity,
            other => bail!("Unknown activation '{other}' (expected relu, gelu, prelu, elu or identity)"),
        })
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivationKind::Relu => "relu",
            ActivationKind::Gelu => "gelu",
            ActivationKind::Prelu => "prelu",
            ActivationKind::Elu => "elu",
            ActivationKind::Identity => "identity",
        };
        f.write_str(name)
    }
}

#[derive(Module, Debug)]
pub struct Activation<B: Backend> {
    kind:  Ignored<ActivationKind>,
    prelu: Option<PRelu<B>>,
}

impl<B: Backend> Activation<B> {
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match (self.kind.0, &self.prelu) {
            (ActivationKind::Relu, _) => activation::relu(x),
            (ActivationKind::Gelu, _) => activation::gelu(x),
            (ActivationKind::Prelu, Some(prelu)) => prelu.forward(x),
            (ActivationKind::Elu, _) => elu(x, 1.0),
            (ActivationKind::Prelu, None) | (ActivationKind::Identity, _) => x,
        }
    }
}

/// ELU with scale `alpha` on the negative side.
pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f64) -> Tensor<B, D> {
    let positive = x.clone().clamp_min(0.0);
    let negative = (x.clamp_max(0.0).exp() - 1.0) * alpha;
    positive + negative
}
