//! Recommendation command.

use std::path::PathBuf;

use clap::Args;

use super::{adhoc_context, split_list, train_engine, trained_context, CliResult, Global};

#[derive(Args)]
pub struct RecommendArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
    /// Id of a context from the dataset
    #[arg(long, conflicts_with = "feature", required_unless_present = "feature")]
    context: Option<String>,
    /// Ad-hoc context feature as dim=value[:weight] (repeatable)
    #[arg(long)]
    feature: Vec<String>,
    /// Comma-separated candidate items (default: every trained item)
    #[arg(long)]
    items: Option<String>,
    /// Number of results
    #[arg(short, long, default_value = "5")]
    k: usize,
}

pub fn run(global: &Global, args: RecommendArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;

    let adhoc;
    let context = match &args.context {
        Some(id) => trained_context(&engine, id)?,
        None => {
            adhoc = adhoc_context("query", &args.feature)?;
            &adhoc
        }
    };

    let candidates = match &args.items {
        Some(raw) => split_list(raw),
        None => engine.model().item_ids(),
    };

    let results = engine.recommend(context, &candidates, args.k);
    global.emit(&results, || {
        if results.is_empty() {
            println!("No recommendations");
            return;
        }
        for (rank, r) in results.iter().enumerate() {
            println!("{:>2}. {:<20} {:.3}  {}", rank + 1, r.item_id, r.score, r.explanation);
        }
    })
}
