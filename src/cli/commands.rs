// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Subcommands:
//   inspect  — print the layer plan for an input width
//   encode   — run the encoder over a graph, write embeddings
//   finetune — train a classifier head (and the encoder) on labels
//   generate — write a synthetic SBM graph as JSON
//
// Shared flag groups are flattened into each subcommand.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::{
    encode_use_case::EncodeConfig,
    finetune_use_case::FinetuneConfig,
    graph_input::GraphInput,
    settings::ModelSettings,
};
use crate::data::synthetic::SyntheticGraphConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the layer widths and parameter count of an encoder
    Inspect(InspectArgs),

    /// Encode a graph into node embeddings
    Encode(EncodeArgs),

    /// Fine-tune the encoder as a node classifier
    Finetune(FinetuneArgs),

    /// Write a synthetic labelled graph to a JSON file
    Generate(GenerateArgs),
}

/// Encoder hyperparameters
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Hidden width per attention head
    #[arg(long, default_value_t = 64)]
    pub num_hidden: usize,

    /// Output width per attention head of the last layer
    #[arg(long, default_value_t = 64)]
    pub out_dim: usize,

    /// Number of GAT layers
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Attention heads in every layer except the last
    #[arg(long, default_value_t = 4)]
    pub nhead: usize,

    /// Attention heads in the last layer
    #[arg(long, default_value_t = 1)]
    pub nhead_out: usize,

    /// relu, gelu, prelu, elu or identity
    #[arg(long, default_value = "prelu")]
    pub activation: String,

    /// Dropout on node features before each layer
    #[arg(long, default_value_t = 0.2)]
    pub feat_drop: f64,

    /// Dropout on attention coefficients
    #[arg(long, default_value_t = 0.1)]
    pub attn_drop: f64,

    /// LeakyReLU slope inside the attention score
    #[arg(long, default_value_t = 0.2)]
    pub negative_slope: f64,

    /// Add residual connections
    #[arg(long)]
    pub residual: bool,

    /// none, layernorm or batchnorm
    #[arg(long, default_value = "none")]
    pub norm: String,

    /// Concatenate attention heads instead of averaging them
    #[arg(long)]
    pub concat_out: bool,

    /// Encoding mode: activation (and residual / norm) on the last layer
    #[arg(long)]
    pub encoding: bool,
}

impl TryFrom<ModelArgs> for ModelSettings {
    type Error = anyhow::Error;

    fn try_from(a: ModelArgs) -> Result<Self> {
        Ok(ModelSettings {
            num_hidden:     a.num_hidden,
            out_dim:        a.out_dim,
            num_layers:     a.num_layers,
            nhead:          a.nhead,
            nhead_out:      a.nhead_out,
            activation:     a.activation.parse()?,
            feat_drop:      a.feat_drop,
            attn_drop:      a.attn_drop,
            negative_slope: a.negative_slope,
            residual:       a.residual,
            norm:           a.norm.parse()?,
            concat_out:     a.concat_out,
            encoding:       a.encoding,
        })
    }
}

/// Where the graph comes from. Without --graph a stochastic
/// block model is generated.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Graph JSON file
    #[arg(long)]
    pub graph: Option<String>,

    /// Synthetic graph: number of nodes
    #[arg(long, default_value_t = 120)]
    pub nodes: usize,

    /// Synthetic graph: number of classes
    #[arg(long, default_value_t = 3)]
    pub classes: usize,

    /// Synthetic graph: feature width
    #[arg(long, default_value_t = 16)]
    pub features: usize,

    /// Seed for the synthetic graph and for initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<GraphArgs> for GraphInput {
    fn from(a: GraphArgs) -> Self {
        match a.graph {
            Some(path) => GraphInput::File(path),
            None => GraphInput::Synthetic(SyntheticGraphConfig {
                num_nodes:   a.nodes,
                num_classes: a.classes,
                feature_dim: a.features,
                seed:        a.seed,
                ..Default::default()
            }),
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input feature width
    #[arg(long)]
    pub in_dim: usize,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Load the encoder from this checkpoint directory
    #[arg(long)]
    pub checkpoint_dir: Option<String>,

    /// Write embeddings to this JSON file
    #[arg(long)]
    pub output: Option<String>,

    /// Also write every layer's output
    #[arg(long)]
    pub hidden: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl TryFrom<EncodeArgs> for EncodeConfig {
    type Error = anyhow::Error;

    fn try_from(a: EncodeArgs) -> Result<Self> {
        Ok(EncodeConfig {
            seed:           a.graph.seed,
            graph:          a.graph.into(),
            checkpoint_dir: a.checkpoint_dir,
            output:         a.output,
            return_hidden:  a.hidden,
            model:          a.model.try_into()?,
        })
    }
}

#[derive(Args, Debug)]
pub struct FinetuneArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Directory for checkpoints, configs and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of full-graph training steps
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 5e-3)]
    pub lr: f64,

    /// L2 penalty applied by Adam
    #[arg(long, default_value_t = 5e-4)]
    pub weight_decay: f64,

    /// Share of nodes used for the loss; the rest are validation
    #[arg(long, default_value_t = 0.6)]
    pub train_fraction: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl TryFrom<FinetuneArgs> for FinetuneConfig {
    type Error = anyhow::Error;

    fn try_from(a: FinetuneArgs) -> Result<Self> {
        Ok(FinetuneConfig {
            seed:           a.graph.seed,
            graph:          a.graph.into(),
            checkpoint_dir: a.checkpoint_dir,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            train_fraction: a.train_fraction,
            model:          a.model.try_into()?,
        })
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Destination graph JSON file
    #[arg(long, default_value = "graph.json")]
    pub output: String,
}
