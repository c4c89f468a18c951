use std::path::PathBuf;

use clap::Args;

use super::{train_engine, CliResult, Global};

#[derive(Args)]
pub struct StatsArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
    /// Number of top habits to show (default: stats.top_n)
    #[arg(long)]
    top: Option<usize>,
}

pub fn run(global: &Global, args: StatsArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;
    let top_n = args.top.unwrap_or(engine.config().stats.top_n);
    let stats = engine.habit_statistics().top(top_n);

    global.emit(&stats, || {
        println!("Total habits:       {}", stats.total_habits);
        println!("Average strength:   {:.3}", stats.avg_habit_strength);
        println!("Distinct contexts:  {}", stats.distinct_contexts);
        println!("Distinct items:     {}", stats.distinct_items);
        println!("Rules:              {}", stats.total_rules);
        if !stats.top_habits.is_empty() {
            println!("Top habits:");
            for h in &stats.top_habits {
                println!("  {:<20} {:.3}  ({})", h.item_id, h.strength, h.context_id);
            }
        }
    })
}
