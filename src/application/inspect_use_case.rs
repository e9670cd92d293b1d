// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Builds the encoder for a given input width and describes the
// layers it actually holds, without touching any graph.

use anyhow::Result;
use burn::module::Module;

use crate::application::settings::ModelSettings;
use crate::ml::{
    inferencer::InferBackend,
    model::{GatConfig, LayerSpec},
};

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub config:       GatConfig,
    pub layers:       Vec<LayerSpec>,
    /// Activation after the last layer (encoding mode)
    pub final_activation: bool,
    pub output_width: usize,
    pub num_params:   usize,
}

pub struct InspectUseCase {
    in_dim:   usize,
    settings: ModelSettings,
}

impl InspectUseCase {
    pub fn new(in_dim: usize, settings: ModelSettings) -> Self {
        Self { in_dim, settings }
    }

    pub fn execute(&self) -> Result<ModelReport> {
        let config = self.settings.to_gat_config(self.in_dim)?;
        let model  = config.init::<InferBackend>(&Default::default());

        Ok(ModelReport {
            layers:       model.layers().iter().map(LayerSpec::of).collect(),
            final_activation: model.has_last_activation(),
            output_width: model.output_width(),
            num_params:   model.num_params(),
            config,
        })
    }
}
