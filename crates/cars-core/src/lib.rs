//! # CARS Core Library
//!
//! This library provides the core logic of CARS, a context-aware
//! recommendation engine. Item choices are modelled as habits that form
//! under specific contexts (time, location, mood, ...), and items are
//! ranked for a query context from three kinds of evidence. All operations
//! are also available through the standalone `cars` CLI binary, a thin
//! layer over this library.
//!
//! ## Architecture
//!
//! - **Habit Model**: strength `H = α·R' + β·PR` per (context, item), from
//!   log-normalized repetitions and normalized ratings
//! - **Context Similarity**: cosine similarity over weighted
//!   (dimension, value) tokens
//! - **Rule Extraction**: "IF features THEN item" association rules with
//!   support and confidence thresholds
//! - **Ranking**: direct habit, similar-context transfer and rule evidence
//!   blended into one explained score
//! - **Transfer**: source habits projected onto an unseen target context
//!
//! ## Key Components
//!
//! - [`Engine`]: owns the current [`TrainedModel`] and re-trains it
//! - [`TrainedModel`]: immutable habit table, rule set and context catalog
//! - [`EngineConfig`]: TOML configuration of every tunable constant
//! - [`evaluate`]: offline precision/recall against a held-out dataset

pub mod config;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod habit;
pub mod interaction;
pub mod model;
pub mod recommend;
pub mod rules;
pub mod similarity;
pub mod stats;
pub mod transfer;

pub use config::{EngineConfig, HabitConfig, RankingConfig, RuleConfig, StatsConfig};
pub use context::{Context, ContextFeature, FeatureToken};
pub use error::{ConfigError, CoreError, ValidationError};
pub use evaluation::{evaluate, ContextEvaluation, EvaluationReport};
pub use habit::{habit_strength, HabitRecord, HabitTable};
pub use interaction::{Dataset, Interaction};
pub use model::{Engine, RecordKind, RejectedRecord, TrainedModel, TrainingReport};
pub use recommend::{RecommendationResult, Signal, SignalTerm};
pub use rules::{AssociationRule, RuleSet};
pub use similarity::similarity;
pub use stats::{HabitStatistics, ItemStrength};
pub use transfer::{TransferOverlap, TransferResult};
