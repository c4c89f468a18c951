use cars_core::EngineConfig;
use clap::Subcommand;

use super::{CliResult, Global};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Get a config value
    Get {
        /// Dotted key (e.g. "habit.alpha", "ranking.direct_weight")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(global: &Global, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Path => {
            println!("{}", global.config_path()?.display());
        }
        ConfigAction::Get { key } => {
            let config = global.load_config()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = global.load_config()?;
            config.set(&key, &value)?;
            config.save_to(global.config_path()?)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = global.load_config()?;
            if global.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            EngineConfig::default().save_to(global.config_path()?)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
