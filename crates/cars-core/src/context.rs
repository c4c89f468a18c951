//! Context feature vectors.
//!
//! A [`Context`] describes the situation a choice is made in (time,
//! location, social setting, mood, weather, ...). Each dimension holds one
//! categorical value and an importance weight. Contexts are immutable once
//! built and are identified by id.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Weight given to a feature when none is specified.
pub const DEFAULT_FEATURE_WEIGHT: f64 = 1.0;

fn default_weight() -> f64 {
    DEFAULT_FEATURE_WEIGHT
}

/// One weighted dimension of a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFeature {
    /// Dimension identifier (e.g. "time", "location")
    pub dimension: String,
    /// Categorical value (e.g. "evening", "home")
    pub value: String,
    /// Importance weight (non-negative)
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl ContextFeature {
    /// Create a feature with the default weight.
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
            weight: DEFAULT_FEATURE_WEIGHT,
        }
    }

    /// Override the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// The atomic (dimension, value) token this feature contributes.
    pub fn token(&self) -> FeatureToken {
        FeatureToken::new(&self.dimension, &self.value)
    }
}

/// Atomic (dimension, value) pair.
///
/// Ordered by dimension first, so sorted token lists line up across
/// contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureToken {
    pub dimension: String,
    pub value: String,
}

impl FeatureToken {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FeatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.dimension, self.value)
    }
}

/// A situation in which a choice is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    id: String,
    name: String,
    #[serde(default)]
    features: Vec<ContextFeature>,
}

impl Context {
    /// Build a validated context.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the id is blank, there are no
    /// features, a dimension repeats, or a weight is negative/non-finite.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        features: Vec<ContextFeature>,
    ) -> Result<Self, ValidationError> {
        let context = Self {
            id: id.into(),
            name: name.into(),
            features,
        };
        context.validate()?;
        Ok(context)
    }

    /// Re-check the construction invariants.
    ///
    /// Contexts deserialized from a dataset bypass [`Context::new`], so
    /// training calls this before accepting them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier {
                field: "context id".into(),
            });
        }
        if self.features.is_empty() {
            return Err(ValidationError::EmptyContext {
                context_id: self.id.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.features.len());
        for feature in &self.features {
            if feature.dimension.trim().is_empty() {
                return Err(ValidationError::EmptyIdentifier {
                    field: format!("feature dimension in context '{}'", self.id),
                });
            }
            if !seen.insert(feature.dimension.as_str()) {
                return Err(ValidationError::DuplicateDimension {
                    context_id: self.id.clone(),
                    dimension: feature.dimension.clone(),
                });
            }
            if !feature.weight.is_finite() || feature.weight < 0.0 {
                return Err(ValidationError::InvalidWeight {
                    context_id: self.id.clone(),
                    dimension: feature.dimension.clone(),
                    weight: feature.weight,
                });
            }
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[ContextFeature] {
        &self.features
    }

    /// Look up the feature for a dimension.
    pub fn feature(&self, dimension: &str) -> Option<&ContextFeature> {
        self.features.iter().find(|f| f.dimension == dimension)
    }

    /// Whether the context holds this exact (dimension, value) pair.
    pub fn contains(&self, token: &FeatureToken) -> bool {
        self.feature(&token.dimension)
            .is_some_and(|f| f.value == token.value)
    }

    /// Atomic tokens, sorted by dimension.
    pub fn tokens(&self) -> Vec<FeatureToken> {
        let mut tokens: Vec<FeatureToken> = self.features.iter().map(ContextFeature::token).collect();
        tokens.sort();
        tokens
    }

    /// Largest feature weight, 0.0 when every weight is zero.
    pub fn max_weight(&self) -> f64 {
        self.features.iter().map(|f| f.weight).fold(0.0, f64::max)
    }

    /// Norm of the weights after dividing by [`Context::max_weight`].
    ///
    /// In `[1, sqrt(n)]` for a non-degenerate context, so it neither
    /// overflows nor underflows for any finite weights.
    pub fn relative_norm(&self) -> f64 {
        let max = self.max_weight();
        if max == 0.0 {
            return 0.0;
        }
        self.features
            .iter()
            .map(|f| {
                let r = f.weight / max;
                r * r
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Euclidean norm of the weighted one-hot encoding.
    pub fn norm(&self) -> f64 {
        self.max_weight() * self.relative_norm()
    }

    /// True when the weight vector has zero norm; such a context is similar to nothing.
    pub fn is_degenerate(&self) -> bool {
        self.relative_norm() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home_evening() -> Context {
        Context::new(
            "home_evening",
            "Home evening",
            vec![
                ContextFeature::new("time", "evening"),
                ContextFeature::new("location", "home").with_weight(2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn tokens_are_sorted_by_dimension() {
        let ctx = home_evening();
        let tokens = ctx.tokens();
        assert_eq!(tokens[0], FeatureToken::new("location", "home"));
        assert_eq!(tokens[1], FeatureToken::new("time", "evening"));
    }

    #[test]
    fn contains_checks_value_not_just_dimension() {
        let ctx = home_evening();
        assert!(ctx.contains(&FeatureToken::new("time", "evening")));
        assert!(!ctx.contains(&FeatureToken::new("time", "morning")));
        assert!(!ctx.contains(&FeatureToken::new("mood", "happy")));
    }

    #[test]
    fn norm_uses_weights() {
        let ctx = home_evening();
        assert!((ctx.norm() - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rejects_empty_feature_list() {
        let err = Context::new("c", "C", vec![]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyContext {
                context_id: "c".into()
            }
        );
    }

    #[test]
    fn rejects_duplicate_dimension() {
        let err = Context::new(
            "c",
            "C",
            vec![
                ContextFeature::new("time", "evening"),
                ContextFeature::new("time", "morning"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateDimension { .. }));
    }

    #[test]
    fn rejects_negative_and_nan_weights() {
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let err = Context::new(
                "c",
                "C",
                vec![ContextFeature::new("time", "evening").with_weight(weight)],
            )
            .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidWeight { .. }));
        }
    }

    #[test]
    fn weight_defaults_when_missing_from_json() {
        let json = r#"{"id":"c","name":"C","features":[{"dimension":"time","value":"noon"}]}"#;
        let ctx: Context = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.features()[0].weight, 1.0);
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn zero_weights_are_degenerate() {
        let ctx = Context::new(
            "c",
            "C",
            vec![ContextFeature::new("time", "evening").with_weight(0.0)],
        )
        .unwrap();
        assert!(ctx.is_degenerate());
        assert_eq!(ctx.norm(), 0.0);
    }

    #[test]
    fn extreme_weights_keep_a_finite_norm() {
        let tiny = Context::new(
            "c",
            "C",
            vec![ContextFeature::new("time", "evening").with_weight(1e-200)],
        )
        .unwrap();
        assert!(!tiny.is_degenerate());
        assert_eq!(tiny.relative_norm(), 1.0);
        assert!(tiny.norm() > 0.0);

        let huge = Context::new(
            "c",
            "C",
            vec![
                ContextFeature::new("time", "evening").with_weight(1e200),
                ContextFeature::new("location", "home"),
            ],
        )
        .unwrap();
        assert!(huge.norm().is_finite());
        assert_eq!(huge.max_weight(), 1e200);
    }

    #[test]
    fn missing_features_key_deserializes_as_empty() {
        let json = r#"{"id":"broken","name":"Broken"}"#;
        let ctx: Context = serde_json::from_str(json).unwrap();
        assert!(ctx.features().is_empty());
        assert_eq!(
            ctx.validate(),
            Err(ValidationError::EmptyContext {
                context_id: "broken".into()
            })
        );
    }
}
