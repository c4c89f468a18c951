use std::path::PathBuf;

use cars_core::AssociationRule;
use clap::Args;

use super::{train_engine, trained_context, CliResult, Global};

#[derive(Args)]
pub struct RulesArgs {
    /// JSON dataset with contexts and interactions
    #[arg(long)]
    data: PathBuf,
    /// Only rules that fire in this context
    #[arg(long)]
    context: Option<String>,
}

pub fn run(global: &Global, args: RulesArgs) -> CliResult {
    let (engine, _) = train_engine(global, &args.data)?;
    let model = engine.model();

    let rules: Vec<&AssociationRule> = match &args.context {
        Some(id) => model.rules_for_context(trained_context(&engine, id)?),
        None => model.rules().iter().collect(),
    };

    global.emit(&rules, || {
        if rules.is_empty() {
            println!("No rules");
        }
        for rule in &rules {
            println!("{rule}");
        }
    })
}
