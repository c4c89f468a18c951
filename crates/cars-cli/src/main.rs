use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cars", version, about = "Context-aware recommendation engine CLI")]
struct Cli {
    /// Config file (default: ~/.config/cars/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a dataset and print the training report
    Train(commands::train::TrainArgs),
    /// Rank items for a context
    Recommend(commands::recommend::RecommendArgs),
    /// Habit statistics
    Stats(commands::stats::StatsArgs),
    /// Transfer habits from one context to another
    Transfer(commands::transfer::TransferArgs),
    /// Rank trained contexts by similarity to one context
    Similar(commands::similar::SimilarArgs),
    /// List extracted association rules
    Rules(commands::rules::RulesArgs),
    /// Evaluate ranking quality on a held-out dataset
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let global = commands::Global {
        config: cli.config,
        json: cli.json,
    };
    let result = match cli.command {
        Commands::Train(args) => commands::train::run(&global, args),
        Commands::Recommend(args) => commands::recommend::run(&global, args),
        Commands::Stats(args) => commands::stats::run(&global, args),
        Commands::Transfer(args) => commands::transfer::run(&global, args),
        Commands::Similar(args) => commands::similar::run(&global, args),
        Commands::Rules(args) => commands::rules::run(&global, args),
        Commands::Evaluate(args) => commands::evaluate::run(&global, args),
        Commands::Config { action } => commands::config::run(&global, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
