//! Training report command.

use std::path::PathBuf;

use cars_core::{HabitStatistics, TrainingReport};
use clap::Args;
use serde::Serialize;

use super::{train_engine, CliResult, Global};

#[derive(Args)]
pub struct TrainArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
}

#[derive(Serialize)]
struct TrainOutput<'a> {
    report: &'a TrainingReport,
    statistics: HabitStatistics,
}

pub fn run(global: &Global, args: TrainArgs) -> CliResult {
    let (engine, report) = train_engine(global, &args.data)?;
    let top_n = engine.config().stats.top_n;
    let statistics = engine.habit_statistics().top(top_n);

    let output = TrainOutput {
        report: &report,
        statistics,
    };
    global.emit(&output, || {
        println!(
            "Trained generation {} at {}",
            report.generation,
            report.trained_at.to_rfc3339()
        );
        println!("  contexts:     {}", report.accepted_contexts);
        println!("  interactions: {}", report.accepted_interactions);
        println!("  habits:       {}", report.total_habits);
        println!("  rules:        {}", report.total_rules);
        if report.has_rejections() {
            println!("Rejected {} record(s):", report.rejected.len());
            for record in &report.rejected {
                println!("  {:?} #{}: {}", record.kind, record.index, record.error);
            }
        }
        println!(
            "Average habit strength: {:.3}",
            output.statistics.avg_habit_strength
        );
    })
}
