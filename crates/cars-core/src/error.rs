//! Core error types for cars-core.
//!
//! Only malformed input is ever surfaced to callers. Queries against an
//! untrained model or unknown ids degrade to empty/zero results instead.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for cars-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Malformed contexts and interactions.
///
/// Raised per record: a bad record is rejected without aborting the
/// training pass it belongs to.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Context carries no features
    #[error("context '{context_id}' has no features")]
    EmptyContext { context_id: String },

    /// Same dimension listed twice in one context
    #[error("context '{context_id}' lists dimension '{dimension}' more than once")]
    DuplicateDimension {
        context_id: String,
        dimension: String,
    },

    /// Feature weight negative or not finite
    #[error("context '{context_id}' has invalid weight {weight} for dimension '{dimension}'")]
    InvalidWeight {
        context_id: String,
        dimension: String,
        weight: f64,
    },

    /// Rating outside [0, max]
    #[error("rating {rating} is outside the scale [0, {max}]")]
    RatingOutOfRange { rating: f64, max: f64 },

    /// Interaction references a context absent from the catalog
    #[error("interaction references unknown context '{context_id}'")]
    UnknownContext { context_id: String },

    /// Two catalog entries share an id
    #[error("context '{context_id}' is defined more than once")]
    DuplicateContext { context_id: String },

    /// Blank identifier
    #[error("{field} must not be empty")]
    EmptyIdentifier { field: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
