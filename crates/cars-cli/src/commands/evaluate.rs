//! Offline evaluation command.

use std::path::PathBuf;

use cars_core::{evaluate, Dataset};
use clap::Args;

use super::{split_list, train_engine, CliResult, Global};

#[derive(Args)]
pub struct EvaluateArgs {
    /// Training dataset
    #[arg(long)]
    data: PathBuf,
    /// Held-out dataset to score against
    #[arg(long)]
    test: PathBuf,
    /// Cut-off rank
    #[arg(short, long, default_value = "5")]
    k: usize,
    /// Minimum mean rating for an item to count as relevant
    #[arg(long, default_value = "4.0")]
    threshold: f64,
    /// Comma-separated candidate items (default: every trained item)
    #[arg(long)]
    items: Option<String>,
}

pub fn run(global: &Global, args: EvaluateArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;
    let test = Dataset::load(&args.test)?;
    let candidates = match &args.items {
        Some(raw) => split_list(raw),
        None => engine.model().item_ids(),
    };

    let report = evaluate(engine.model(), &test, &candidates, args.k, args.threshold);
    global.emit(&report, || {
        println!("Contexts evaluated: {}", report.contexts_evaluated);
        println!("Contexts skipped:   {}", report.skipped_contexts);
        println!("Precision@{}:       {:.3}", report.k, report.precision_at_k);
        println!("Recall@{}:          {:.3}", report.k, report.recall_at_k);
        println!("Hit rate:           {:.3}", report.hit_rate);
    })
}
