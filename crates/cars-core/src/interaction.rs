//! Interaction log and training datasets.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{Result, ValidationError};

/// One observed choice of an item in a context.
///
/// Several interactions for the same (context, item) pair accumulate:
/// repetition counts are summed and ratings averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub context_id: String,
    pub item_id: String,
    /// How often the item was chosen in this context
    #[serde(default)]
    pub repetition_count: u32,
    /// Satisfaction on the configured rating scale
    pub rating: f64,
}

impl Interaction {
    pub fn new(
        context_id: impl Into<String>,
        item_id: impl Into<String>,
        repetition_count: u32,
        rating: f64,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            item_id: item_id.into(),
            repetition_count,
            rating,
        }
    }

    /// Check identifiers and that the rating sits in `[0, rating_max]`.
    pub fn validate(&self, rating_max: f64) -> Result<(), ValidationError> {
        if self.context_id.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier {
                field: "context_id".into(),
            });
        }
        if self.item_id.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier {
                field: "item_id".into(),
            });
        }
        if !self.rating.is_finite() || self.rating < 0.0 || self.rating > rating_max {
            return Err(ValidationError::RatingOutOfRange {
                rating: self.rating,
                max: rating_max,
            });
        }
        Ok(())
    }
}

/// Training input: a context catalog plus the interaction log over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Dataset {
    pub fn new(contexts: Vec<Context>, interactions: Vec<Interaction>) -> Self {
        Self {
            contexts,
            interactions,
        }
    }

    /// Parse a dataset from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON dataset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// First catalog entry with this id.
    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}
