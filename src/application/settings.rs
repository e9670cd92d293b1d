// ============================================================
// Layer 2 — Model Settings
// ============================================================
// Everything about the encoder except the input width, which
// is only known once the graph has been loaded. Serialisable
// so a run's settings can be written next to its checkpoints.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ml::{activation::ActivationKind, model::GatConfig, norm::NormKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub num_hidden:     usize,
    pub out_dim:        usize,
    pub num_layers:     usize,
    pub nhead:          usize,
    pub nhead_out:      usize,
    pub activation:     ActivationKind,
    pub feat_drop:      f64,
    pub attn_drop:      f64,
    pub negative_slope: f64,
    pub residual:       bool,
    pub norm:           NormKind,
    pub concat_out:     bool,
    pub encoding:       bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            num_hidden:     64,
            out_dim:        64,
            num_layers:     2,
            nhead:          4,
            nhead_out:      1,
            activation:     ActivationKind::Prelu,
            feat_drop:      0.2,
            attn_drop:      0.1,
            negative_slope: 0.2,
            residual:       false,
            norm:           NormKind::None,
            concat_out:     false,
            encoding:       false,
        }
    }
}

impl ModelSettings {
    /// Build a validated encoder config for inputs of width `in_dim`.
    pub fn to_gat_config(&self, in_dim: usize) -> Result<GatConfig> {
        let cfg = GatConfig::new(
            in_dim,
            self.num_hidden,
            self.out_dim,
            self.num_layers,
            self.nhead,
            self.nhead_out,
        )
        .with_activation(self.activation)
        .with_feat_drop(self.feat_drop)
        .with_attn_drop(self.attn_drop)
        .with_negative_slope(self.negative_slope)
        .with_residual(self.residual)
        .with_norm(self.norm)
        .with_concat_out(self.concat_out)
        .with_encoding(self.encoding);

        cfg.validate()?;
        Ok(cfg)
    }
}
