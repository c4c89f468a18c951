//! TOML-based engine configuration.
//!
//! Holds the tunable constants of the engine:
//! - Habit model coefficients and scales
//! - Rule mining thresholds
//! - Recommendation blending weights
//! - Reporting defaults
//!
//! The default location is `~/.config/cars/config.toml`
//! (`~/.config/cars-dev/` when `CARS_ENV=dev`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Habit model coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitConfig {
    /// Weight of the repetition term
    #[serde(default = "default_half")]
    pub alpha: f64,
    /// Weight of the reinforcement term
    #[serde(default = "default_half")]
    pub beta: f64,
    /// Repetition count at which the repetition term saturates
    #[serde(default = "default_repetition_cap")]
    pub repetition_cap: u32,
    /// Top of the rating scale
    #[serde(default = "default_rating_max")]
    pub rating_max: f64,
}

/// Association rule mining thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_min_support")]
    pub min_support: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// 1 = single-feature rules only, 2 = also mine feature pairs
    #[serde(default = "default_max_antecedent_len")]
    pub max_antecedent_len: usize,
}

/// Recommendation blending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Weight of habit strength in the exact context
    #[serde(default = "default_direct_weight")]
    pub direct_weight: f64,
    /// Weight of the similarity-weighted estimate from other contexts
    #[serde(default = "default_indirect_weight")]
    pub indirect_weight: f64,
    /// Weight of the best matching rule confidence
    #[serde(default = "default_rule_weight")]
    pub rule_weight: f64,
    /// Contexts at or below this similarity give no indirect evidence
    #[serde(default)]
    pub min_similarity: f64,
    /// Drop zero-score items from recommendation output
    #[serde(default)]
    pub non_zero_only: bool,
}

/// Reporting defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// How many top habits callers show
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub habit: HabitConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

// Default functions
fn default_half() -> f64 {
    0.5
}
fn default_repetition_cap() -> u32 {
    100
}
fn default_rating_max() -> f64 {
    5.0
}
fn default_min_support() -> f64 {
    0.05
}
fn default_min_confidence() -> f64 {
    0.3
}
fn default_max_antecedent_len() -> usize {
    2
}
fn default_direct_weight() -> f64 {
    0.6
}
fn default_indirect_weight() -> f64 {
    0.25
}
fn default_rule_weight() -> f64 {
    0.15
}
fn default_top_n() -> usize {
    5
}

impl Default for HabitConfig {
    fn default() -> Self {
        Self {
            alpha: default_half(),
            beta: default_half(),
            repetition_cap: default_repetition_cap(),
            rating_max: default_rating_max(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            min_confidence: default_min_confidence(),
            max_antecedent_len: default_max_antecedent_len(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            direct_weight: default_direct_weight(),
            indirect_weight: default_indirect_weight(),
            rule_weight: default_rule_weight(),
            min_similarity: 0.0,
            non_zero_only: false,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn check_non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(key, format!("must be a finite non-negative number, got {value}")));
    }
    Ok(())
}

fn check_unit(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(invalid(key, format!("must be in [0.0, 1.0], got {value}")));
    }
    Ok(())
}

/// Returns `~/.config/cars[-dev]/` based on CARS_ENV.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CARS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cars-dev")
    } else {
        base_dir.join("cars")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl EngineConfig {
    /// Check ranges and the blending invariants.
    ///
    /// Ranking weights must sum to at most 1 so composite scores stay in
    /// [0, 1], and the direct weight must be at least the other two
    /// combined so indirect signals can never outrank exact-context evidence
    /// of equal strength.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("habit.alpha", self.habit.alpha)?;
        check_non_negative("habit.beta", self.habit.beta)?;
        if self.habit.repetition_cap == 0 {
            return Err(invalid("habit.repetition_cap", "must be at least 1"));
        }
        if !self.habit.rating_max.is_finite() || self.habit.rating_max <= 0.0 {
            return Err(invalid(
                "habit.rating_max",
                format!("must be positive, got {}", self.habit.rating_max),
            ));
        }

        check_unit("rules.min_support", self.rules.min_support)?;
        check_unit("rules.min_confidence", self.rules.min_confidence)?;
        if !(1..=2).contains(&self.rules.max_antecedent_len) {
            return Err(invalid(
                "rules.max_antecedent_len",
                format!("must be 1 or 2, got {}", self.rules.max_antecedent_len),
            ));
        }

        let r = &self.ranking;
        check_unit("ranking.direct_weight", r.direct_weight)?;
        check_unit("ranking.indirect_weight", r.indirect_weight)?;
        check_unit("ranking.rule_weight", r.rule_weight)?;
        check_unit("ranking.min_similarity", r.min_similarity)?;
        let sum = r.direct_weight + r.indirect_weight + r.rule_weight;
        if sum > 1.0 + 1e-9 {
            return Err(invalid(
                "ranking",
                format!("weights must sum to at most 1.0, got {sum}"),
            ));
        }
        if r.direct_weight + 1e-9 < r.indirect_weight + r.rule_weight {
            return Err(invalid(
                "ranking.direct_weight",
                "must be at least indirect_weight + rule_weight",
            ));
        }
        Ok(())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg = Self::from_toml_str(&content)?;
        Ok(cfg)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist as TOML.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(key, e.to_string()))?,
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(key, format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key and re-validate.
    ///
    /// The config is left untouched when the key is unknown, the value does
    /// not parse, or the result fails [`EngineConfig::validate`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json)
            .map_err(|e| invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.habit.repetition_cap, 100);
        assert_eq!(parsed.stats.top_n, 5);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = EngineConfig::from_toml_str("[habit]\nalpha = 0.7\n").unwrap();
        assert_eq!(cfg.habit.alpha, 0.7);
        assert_eq!(cfg.habit.beta, 0.5);
        assert_eq!(cfg.rules.min_confidence, 0.3);
    }

    #[test]
    fn rejects_weights_summing_above_one() {
        let mut cfg = EngineConfig::default();
        cfg.ranking.indirect_weight = 0.3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_direct_weight_below_others() {
        let mut cfg = EngineConfig::default();
        cfg.ranking.direct_weight = 0.3;
        cfg.ranking.indirect_weight = 0.3;
        cfg.ranking.rule_weight = 0.2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_scales() {
        let mut cfg = EngineConfig::default();
        cfg.habit.rating_max = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.habit.repetition_cap = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.rules.max_antecedent_len = 3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn get_by_dotted_key() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.get("habit.repetition_cap").as_deref(), Some("100"));
        assert_eq!(cfg.get("ranking.non_zero_only").as_deref(), Some("false"));
        assert_eq!(cfg.get("nope.missing"), None);
    }

    #[test]
    fn set_updates_and_validates() {
        let mut cfg = EngineConfig::default();
        cfg.set("habit.alpha", "0.8").unwrap();
        assert_eq!(cfg.habit.alpha, 0.8);

        cfg.set("ranking.non_zero_only", "true").unwrap();
        assert!(cfg.ranking.non_zero_only);

        cfg.set("habit.rating_max", "10").unwrap();
        assert_eq!(cfg.habit.rating_max, 10.0);
    }

    #[test]
    fn set_rejects_unknown_keys_and_invalid_values() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set("habit.gamma", "1").is_err());
        assert!(cfg.set("habit", "1").is_err());
        assert!(cfg.set("habit.alpha", "abc").is_err());
        assert!(cfg.set("ranking.direct_weight", "0.1").is_err());
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = EngineConfig::default();
        cfg.rules.min_support = 0.1;
        cfg.save_to(&path).unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.rules.min_support, 0.1);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load_from(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
    }
}
