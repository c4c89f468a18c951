//! Context similarity command.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::{train_engine, trained_context, CliResult, Global};

#[derive(Args)]
pub struct SimilarArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
    /// Context to compare against every other trained context
    #[arg(long)]
    context: String,
}

#[derive(Serialize)]
struct SimilarContext<'a> {
    context_id: &'a str,
    name: &'a str,
    similarity: f64,
}

pub fn run(global: &Global, args: SimilarArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;
    let context = trained_context(&engine, &args.context)?;

    let ranked: Vec<SimilarContext<'_>> = engine
        .model()
        .similar_contexts(context)
        .into_iter()
        .map(|(other, similarity)| SimilarContext {
            context_id: other.id(),
            name: other.name(),
            similarity,
        })
        .collect();

    global.emit(&ranked, || {
        for entry in &ranked {
            println!("{:<20} {:.3}  {}", entry.context_id, entry.similarity, entry.name);
        }
    })
}
