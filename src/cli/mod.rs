// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and dispatches to Layer 2. This
// layer only routes and prints; it never computes.
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EncodeArgs, FinetuneArgs, GenerateArgs, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "gat-encoder",
    version = "0.1.0",
    about = "Graph attention network encoder: inspect, encode graphs, fine-tune on node labels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Inspect(args)  => run_inspect(args),
            Commands::Encode(args)   => run_encode(args),
            Commands::Finetune(args) => run_finetune(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.in_dim, args.model.try_into()?).execute()?;

    println!("{:<6} {:>8} {:>8} {:>6} {:>8} {:>9}  norm", "layer", "in", "out", "heads", "width", "residual");
    for (l, s) in report.layers.iter().enumerate() {
        println!(
            "{:<6} {:>8} {:>8} {:>6} {:>8} {:>9}  {}",
            l, s.in_width, s.out_width, s.heads, s.output_width(), s.residual, s.norm,
        );
    }
    let last_act = if report.final_activation { report.config.activation.to_string() } else { "none".into() };
    println!("\nFinal activation: {last_act}");
    println!("Output width: {}", report.output_width);
    println!("Parameters:   {}", report.num_params);
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    use crate::application::encode_use_case::EncodeUseCase;

    tracing::info!("Encoding graph");
    let file = EncodeUseCase::new(args.try_into()?).execute()?;
    println!("Encoded {} nodes into {}-dimensional embeddings.", file.num_nodes, file.width);
    Ok(())
}

fn run_finetune(args: FinetuneArgs) -> Result<()> {
    use crate::application::finetune_use_case::FinetuneUseCase;

    tracing::info!("Starting fine-tuning; checkpoints go to '{}'", args.checkpoint_dir);
    let report = FinetuneUseCase::new(args.try_into()?).execute()?;
    println!(
        "Fine-tuning complete. Best validation accuracy {:.1}% at epoch {}/{}.",
        report.best_val_acc * 100.0,
        report.best_epoch,
        report.epochs,
    );
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::graph_input::{export_graph, GraphInput};

    let output = args.output.clone();
    let graph  = export_graph(&GraphInput::from(args.graph), &output)?;
    println!(
        "Wrote {} nodes and {} edges to '{}'.",
        graph.num_nodes(),
        graph.edges.num_edges(),
        output,
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::graph_input::GraphInput;
    use crate::application::settings::ModelSettings;
    use crate::ml::{activation::ActivationKind, norm::NormKind};

    #[test]
    fn test_parse_finetune_flags() {
        let cli = Cli::try_parse_from([
            "gat-encoder", "finetune",
            "--graph", "g.json",
            "--epochs", "5",
            "--activation", "elu",
            "--norm", "layernorm",
            "--concat-out",
        ])
        .unwrap();

        let Commands::Finetune(args) = cli.command else { panic!("expected finetune") };
        let cfg: crate::application::finetune_use_case::FinetuneConfig = args.try_into().unwrap();
        assert_eq!(cfg.epochs, 5);
        assert!(matches!(cfg.graph, GraphInput::File(ref p) if p == "g.json"));
        assert_eq!(cfg.model.activation, ActivationKind::Elu);
        assert_eq!(cfg.model.norm, NormKind::LayerNorm);
        assert!(cfg.model.concat_out);
        assert!(!cfg.model.encoding);
    }

    #[test]
    fn test_encode_defaults_to_synthetic_graph() {
        let cli = Cli::try_parse_from(["gat-encoder", "encode", "--nodes", "10", "--seed", "3"]).unwrap();
        let Commands::Encode(args) = cli.command else { panic!("expected encode") };
        let cfg: crate::application::encode_use_case::EncodeConfig = args.try_into().unwrap();
        assert_eq!(cfg.seed, 3);
        match cfg.graph {
            GraphInput::Synthetic(s) => assert_eq!((s.num_nodes, s.seed), (10, 3)),
            GraphInput::File(_) => panic!("expected synthetic graph"),
        }
    }

    #[test]
    fn test_generate_writes_loadable_graph() {
        use crate::data::loader::JsonGraphLoader;
        use crate::domain::traits::GraphSource;

        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("sbm.json");
        let cli  = Cli::try_parse_from([
            "gat-encoder", "generate",
            "--nodes", "12",
            "--features", "4",
            "--output", path.to_str().unwrap(),
        ])
        .unwrap();
        cli.run().unwrap();

        let graph = JsonGraphLoader::new(&path).load_graph().unwrap();
        assert_eq!(graph.num_nodes(), 12);
        assert_eq!(graph.feature_dim(), 4);
        assert!(graph.labels.is_some());
    }

    #[test]
    fn test_unknown_activation_is_rejected() {
        let cli = Cli::try_parse_from(["gat-encoder", "inspect", "--in-dim", "4", "--activation", "swish"]).unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        assert!(ModelSettings::try_from(args.model).is_err());
    }
}
