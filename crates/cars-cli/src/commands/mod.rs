//! Subcommands and the helpers they share.
//!
//! Nothing is persisted between invocations: every data command loads the
//! dataset, trains in-process and runs one query.

use std::error::Error;
use std::path::{Path, PathBuf};

use cars_core::{Context, ContextFeature, CoreError, Dataset, Engine, EngineConfig, TrainingReport};
use serde::Serialize;

pub mod config;
pub mod evaluate;
pub mod recommend;
pub mod rules;
pub mod similar;
pub mod stats;
pub mod train;
pub mod transfer;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Flags accepted by every subcommand.
pub struct Global {
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl Global {
    pub fn config_path(&self) -> CliResult<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(EngineConfig::path()?),
        }
    }

    /// Explicit `--config` files that do not exist yet fall back to defaults.
    pub fn load_config(&self) -> CliResult<EngineConfig> {
        let config = match &self.config {
            Some(path) if path.exists() => EngineConfig::load_from(path)?,
            Some(_) => EngineConfig::default(),
            None => EngineConfig::load()?,
        };
        Ok(config)
    }

    /// Print JSON or fall back to the text renderer.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> CliResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

/// Load a dataset and train an engine on it.
pub fn train_engine(global: &Global, data: &Path) -> CliResult<(Engine, TrainingReport)> {
    let config = global.load_config()?;
    let dataset = Dataset::load(data)?;
    tracing::debug!(
        path = %data.display(),
        contexts = dataset.contexts.len(),
        interactions = dataset.interactions.len(),
        "loaded dataset"
    );
    let mut engine = Engine::new(config)?;
    let report = engine.train(&dataset);
    Ok((engine, report))
}

/// Find a context the model was trained with.
pub fn trained_context<'a>(engine: &'a Engine, id: &str) -> CliResult<&'a Context> {
    engine
        .model()
        .context(id)
        .ok_or_else(|| CoreError::Custom(format!("unknown context: {id}")).into())
}

/// Build an ad-hoc context from `dim=value` or `dim=value:weight` pairs.
pub fn adhoc_context(id: &str, pairs: &[String]) -> CliResult<Context> {
    let mut features = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (dimension, rest) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected dim=value, got '{pair}'"))?;
        let feature = match rest.rsplit_once(':') {
            Some((value, weight)) => {
                let weight: f64 = weight
                    .parse()
                    .map_err(|_| format!("invalid weight in '{pair}'"))?;
                ContextFeature::new(dimension.trim(), value.trim()).with_weight(weight)
            }
            None => ContextFeature::new(dimension.trim(), rest.trim()),
        };
        features.push(feature);
    }
    Ok(Context::new(id, id, features)?)
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
