//! Habit transfer command.

use std::path::PathBuf;

use cars_core::{TransferOverlap, TransferResult};
use clap::Args;
use serde::Serialize;

use super::{train_engine, trained_context, CliResult, Global};

#[derive(Args)]
pub struct TransferArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
    /// Context whose habits are transferred
    #[arg(long)]
    source: String,
    /// Context receiving the habits
    #[arg(long)]
    target: String,
}

#[derive(Serialize)]
struct TransferOutput {
    overlap: TransferOverlap,
    results: Vec<TransferResult>,
}

pub fn run(global: &Global, args: TransferArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;
    let source = trained_context(&engine, &args.source)?;
    let target = trained_context(&engine, &args.target)?;

    let output = TransferOutput {
        overlap: engine.model().transfer_overlap(source, target),
        results: engine.transfer_habits(source, target),
    };
    global.emit(&output, || {
        let join = |tokens: &[cars_core::FeatureToken]| {
            tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        println!(
            "{} -> {}  similarity {:.3}",
            source.id(),
            target.id(),
            output.overlap.similarity
        );
        println!("  shared:      {}", join(&output.overlap.shared));
        println!("  source only: {}", join(&output.overlap.source_only));
        println!("  target only: {}", join(&output.overlap.target_only));
        for r in &output.results {
            println!(
                "  {:<20} {:.3}  (source {:.3})",
                r.item_id, r.transfer_score, r.source_strength
            );
        }
    })
}
