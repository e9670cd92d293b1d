// ============================================================
// Layer 5 — GAT Encoder
// ============================================================
// A stack of GatConv layers with per-layer activations and a
// swappable output head.
//
// Layer widths (heads are combined by concat or mean):
//
//   1 layer:   in_dim ─► out_dim × nhead_out
//   N layers:  in_dim ─► num_hidden × nhead          (first)
//              w_h    ─► num_hidden × nhead          (middle)
//              w_h    ─► out_dim × nhead_out         (last)
//
//   where w_h = num_hidden * nhead when concat_out, else num_hidden
//
// Encoding mode (the network is used as a feature encoder, not
// a classifier) adds an activation after the last layer and
// lets the last layer use the residual / norm settings.
//
// Reference: Veličković et al. (2018) Graph Attention Networks
//            Hou et al. (2022) GraphMAE

use anyhow::{bail, Result};
use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::domain::edge_index::EdgeIndex;
use crate::ml::{
    activation::{Activation, ActivationKind},
    conv::{Adjacency, AttentionConv, GatConv, GatConvConfig},
    norm::NormKind,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct GatConfig {
    pub in_dim:     usize,
    pub num_hidden: usize,
    pub out_dim:    usize,
    pub num_layers: usize,
    /// Heads of every layer except the last
    pub nhead:      usize,
    /// Heads of the last layer
    pub nhead_out:  usize,
    #[config(default = "ActivationKind::Prelu")]
    pub activation: ActivationKind,
    #[config(default = 0.2)]
    pub feat_drop: f64,
    #[config(default = 0.1)]
    pub attn_drop: f64,
    #[config(default = 0.2)]
    pub negative_slope: f64,
    #[config(default = false)]
    pub residual: bool,
    #[config(default = "NormKind::None")]
    pub norm: NormKind,
    #[config(default = false)]
    pub concat_out: bool,
    #[config(default = false)]
    pub encoding: bool,
}

/// Shape and options of one layer, as decided by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub in_width:  usize,
    /// Per-head output width
    pub out_width: usize,
    pub heads:     usize,
    pub concat:    bool,
    pub residual:  bool,
    pub norm:      NormKind,
}

impl LayerSpec {
    /// Describe a layer that has already been built.
    pub fn of<B: Backend>(layer: &GatConv<B>) -> Self {
        Self {
            in_width:  layer.in_width(),
            out_width: layer.head_width(),
            heads:     layer.heads(),
            concat:    layer.concat(),
            residual:  layer.has_residual(),
            norm:      layer.norm_kind(),
        }
    }

    pub fn output_width(&self) -> usize {
        if self.concat { self.out_width * self.heads } else { self.out_width }
    }
}

impl GatConfig {
    /// Reject configurations that cannot produce a usable encoder.
    /// `layer_plan` / `init` do not call this; it guards user input.
    pub fn validate(&self) -> Result<()> {
        if self.num_layers == 0 {
            bail!("num_layers must be at least 1");
        }
        if self.nhead == 0 || self.nhead_out == 0 {
            bail!("Head counts must be at least 1 (nhead={}, nhead_out={})", self.nhead, self.nhead_out);
        }
        if self.in_dim == 0 || self.out_dim == 0 || (self.num_layers > 1 && self.num_hidden == 0) {
            bail!("Layer widths must be non-zero");
        }
        for (name, p) in [("feat_drop", self.feat_drop), ("attn_drop", self.attn_drop)] {
            if !(0.0..1.0).contains(&p) {
                bail!("{name} must be in [0, 1), got {p}");
            }
        }
        Ok(())
    }

    /// Widths and options of every layer, first to last.
    /// Each layer's input width is the previous layer's actual output
    /// width: `num_hidden * nhead` when concatenating, `num_hidden` when averaging.
    pub fn layer_plan(&self) -> Vec<LayerSpec> {
        let last_residual = self.encoding && self.residual;
        let last_norm     = if self.encoding { self.norm } else { NormKind::None };
        let spec = |in_width, out_width, heads, residual, norm| LayerSpec {
            in_width,
            out_width,
            heads,
            concat: self.concat_out,
            residual,
            norm,
        };

        match self.num_layers {
            0 => Vec::new(),
            // Single layer: straight to the output, never residual
            1 => vec![spec(self.in_dim, self.out_dim, self.nhead_out, false, last_norm)],
            n => {
                let hidden_width = if self.concat_out { self.num_hidden * self.nhead } else { self.num_hidden };

                // Input projection (no residual)
                let mut plan = vec![spec(self.in_dim, self.num_hidden, self.nhead, false, self.norm)];
                plan.extend((1..n - 1).map(|_| {
                    spec(hidden_width, self.num_hidden, self.nhead, self.residual, self.norm)
                }));
                plan.push(spec(hidden_width, self.out_dim, self.nhead_out, last_residual, last_norm));
                plan
            }
        }
    }

    /// Width of the encoder output before the head.
    pub fn output_width(&self) -> usize {
        self.layer_plan()
            .last()
            .map(LayerSpec::output_width)
            .unwrap_or(self.in_dim)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Gat<B> {
        let plan = self.layer_plan();

        tracing::info!(
            "Building GAT: in={} hidden={} out={} layers={} heads={}/{} concat={} encoding={}",
            self.in_dim, self.num_hidden, self.out_dim, self.num_layers,
            self.nhead, self.nhead_out, self.concat_out, self.encoding,
        );
        for (l, s) in plan.iter().enumerate() {
            tracing::debug!(
                "  layer {l}: {} -> {} x {} heads (out {}), residual={} norm={}",
                s.in_width, s.out_width, s.heads, s.output_width(), s.residual, s.norm,
            );
        }

        let layers: Vec<GatConv<B>> = plan
            .iter()
            .map(|s| {
                GatConvConfig::new(s.in_width, s.out_width, s.heads)
                    .with_concat(s.concat)
                    .with_negative_slope(self.negative_slope)
                    .with_attn_drop(self.attn_drop)
                    .with_residual(s.residual)
                    .with_norm(s.norm)
                    .init(device)
            })
            .collect();

        let activations = (0..self.num_layers.saturating_sub(1))
            .map(|_| self.activation.init(device))
            .collect();
        let last_activation = self.encoding.then(|| self.activation.init(device));

        Gat {
            layers,
            activations,
            last_activation,
            feat_drop: DropoutConfig::new(self.feat_drop).init(),
            head: OutputHead::identity(),
            out_width: self.output_width(),
        }
    }
}

// ─── Output Head ──────────────────────────────────────────────────────────────
/// Which output head the encoder currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadKind {
    /// Embeddings are returned as they leave the last layer
    Identity,
    /// A linear projection to class logits
    Classifier { in_width: usize, num_classes: usize },
}

#[derive(Module, Debug)]
pub struct OutputHead<B: Backend> {
    classifier: Option<Linear<B>>,
}

impl<B: Backend> OutputHead<B> {
    pub fn identity() -> Self {
        Self { classifier: None }
    }

    pub fn classifier(in_width: usize, num_classes: usize, device: &B::Device) -> Self {
        Self { classifier: Some(LinearConfig::new(in_width, num_classes).init(device)) }
    }

    pub fn kind(&self) -> HeadKind {
        match &self.classifier {
            None => HeadKind::Identity,
            Some(linear) => {
                let [in_width, num_classes] = linear.weight.val().dims();
                HeadKind::Classifier { in_width, num_classes }
            }
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match &self.classifier {
            Some(linear) => linear.forward(x),
            None => x,
        }
    }
}

// ─── Gat ──────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Gat<B: Backend> {
    layers:          Vec<GatConv<B>>,
    /// One per non-final layer
    activations:     Vec<Activation<B>>,
    /// Only present in encoding mode
    last_activation: Option<Activation<B>>,
    feat_drop:       Dropout,
    head:            OutputHead<B>,
    out_width:       usize,
}

/// Output of a forward pass that also collected hidden states.
pub struct GatOutput<B: Backend> {
    /// [num_nodes, width] after the output head
    pub output: Tensor<B, 2>,
    /// One [num_nodes, layer_width] tensor per layer, before the head
    pub hidden: Vec<Tensor<B, 2>>,
}

impl<B: Backend> Gat<B> {
    /// x: [num_nodes, in_dim] → [num_nodes, output width]
    pub fn forward(&self, x: Tensor<B, 2>, edges: &EdgeIndex) -> Tensor<B, 2> {
        let adjacency = Adjacency::from_edges(edges, &x.device());
        self.run(x, &adjacency, None)
    }

    /// Same as `forward`, also returning every layer's output.
    pub fn forward_with_hidden(&self, x: Tensor<B, 2>, edges: &EdgeIndex) -> GatOutput<B> {
        let adjacency  = Adjacency::from_edges(edges, &x.device());
        let mut hidden = Vec::with_capacity(self.layers.len());
        let output     = self.run(x, &adjacency, Some(&mut hidden));
        GatOutput { output, hidden }
    }

    /// Forward over a prebuilt adjacency, for callers that reuse it.
    pub fn forward_adjacency(&self, x: Tensor<B, 2>, adjacency: &Adjacency<B>) -> Tensor<B, 2> {
        self.run(x, adjacency, None)
    }

    fn run(
        &self,
        x:         Tensor<B, 2>,
        adjacency: &Adjacency<B>,
        mut hidden: Option<&mut Vec<Tensor<B, 2>>>,
    ) -> Tensor<B, 2> {
        let last  = self.layers.len().saturating_sub(1);
        let mut h = x;

        for (l, layer) in self.layers.iter().enumerate() {
            h = self.feat_drop.forward(h);
            h = layer.forward(h, adjacency);
            h = if l == last {
                match &self.last_activation {
                    Some(act) => act.forward(h),
                    None => h,
                }
            } else {
                self.activations[l].forward(h)
            };
            if let Some(states) = hidden.as_deref_mut() {
                states.push(h.clone());
            }
        }

        self.head.forward(h)
    }

    /// Replace the output head with a fresh linear classifier
    /// `output_width → num_classes`. Later forward passes return logits.
    pub fn reset_classifier(&mut self, num_classes: usize, device: &B::Device) {
        tracing::info!("Resetting classifier head: {} -> {} classes", self.out_width, num_classes);
        self.head = OutputHead::classifier(self.out_width, num_classes, device);
    }

    pub fn head_kind(&self) -> HeadKind {
        self.head.kind()
    }

    pub fn layers(&self) -> &[GatConv<B>] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Width of the embeddings produced by the last layer.
    pub fn output_width(&self) -> usize {
        self.out_width
    }

    pub fn has_last_activation(&self) -> bool {
        self.last_activation.is_some()
    }
}
