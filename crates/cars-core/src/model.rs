//! Trained model and engine facade.
//!
//! [`TrainedModel`] is an immutable value produced by one training pass:
//! the context catalog, the habit table and the rule set. Every query runs
//! against a model value, so re-training is a value replacement rather than
//! an in-place mutation.
//!
//! [`Engine`] keeps the current model behind an `Arc`. Training needs
//! `&mut Engine`, which gives it exclusive access for its whole duration;
//! [`Engine::snapshot`] hands out the current model for concurrent reads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{Result, ValidationError};
use crate::habit::{HabitRecord, HabitTable};
use crate::interaction::{Dataset, Interaction};
use crate::recommend::{Ranker, RecommendationResult};
use crate::rules::{AssociationRule, RuleSet};
use crate::similarity;
use crate::stats::HabitStatistics;
use crate::transfer::{self, TransferOverlap, TransferResult};

/// Which part of a dataset a rejected record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Context,
    Interaction,
}

/// A record left out of training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub kind: RecordKind,
    /// Position in the dataset's list of that kind
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of one training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub accepted_contexts: usize,
    pub accepted_interactions: usize,
    pub rejected: Vec<RejectedRecord>,
    pub total_habits: usize,
    pub total_rules: usize,
    pub generation: u64,
    pub trained_at: DateTime<Utc>,
}

impl TrainingReport {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Immutable state produced by a training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    config: EngineConfig,
    contexts: BTreeMap<String, Context>,
    habits: HabitTable,
    rules: RuleSet,
    generation: u64,
    trained_at: Option<DateTime<Utc>>,
}

impl TrainedModel {
    /// The untrained state: every query returns empty/zero results.
    pub fn empty(config: EngineConfig) -> Self {
        Self {
            config,
            contexts: BTreeMap::new(),
            habits: HabitTable::default(),
            rules: RuleSet::default(),
            generation: 0,
            trained_at: None,
        }
    }

    /// Train from scratch on a dataset.
    ///
    /// Malformed contexts and interactions are rejected one by one and
    /// listed in the report; the rest of the dataset still trains. An
    /// interaction is rejected when its context is missing or was itself
    /// rejected. `config` is expected to have passed
    /// [`EngineConfig::validate`].
    pub fn train(config: &EngineConfig, dataset: &Dataset) -> (Self, TrainingReport) {
        Self::train_generation(config, dataset, 1)
    }

    fn train_generation(config: &EngineConfig, dataset: &Dataset, generation: u64) -> (Self, TrainingReport) {
        let mut rejected = Vec::new();
        let mut contexts: BTreeMap<String, Context> = BTreeMap::new();
        let mut invalid_contexts: HashMap<&str, ValidationError> = HashMap::new();

        for (index, context) in dataset.contexts.iter().enumerate() {
            let verdict = context.validate().and_then(|()| {
                if contexts.contains_key(context.id()) {
                    Err(ValidationError::DuplicateContext {
                        context_id: context.id().to_string(),
                    })
                } else {
                    Ok(())
                }
            });
            match verdict {
                Ok(()) => {
                    contexts.insert(context.id().to_string(), context.clone());
                }
                Err(error) => {
                    if !contexts.contains_key(context.id()) {
                        invalid_contexts.insert(context.id(), error.clone());
                    }
                    rejected.push(RejectedRecord {
                        kind: RecordKind::Context,
                        index,
                        error,
                    });
                }
            }
        }

        let mut accepted: Vec<&Interaction> = Vec::with_capacity(dataset.interactions.len());
        for (index, interaction) in dataset.interactions.iter().enumerate() {
            let verdict = interaction
                .validate(config.habit.rating_max)
                .and_then(|()| {
                    if contexts.contains_key(&interaction.context_id) {
                        return Ok(());
                    }
                    Err(invalid_contexts
                        .get(interaction.context_id.as_str())
                        .cloned()
                        .unwrap_or_else(|| ValidationError::UnknownContext {
                            context_id: interaction.context_id.clone(),
                        }))
                });
            match verdict {
                Ok(()) => accepted.push(interaction),
                Err(error) => rejected.push(RejectedRecord {
                    kind: RecordKind::Interaction,
                    index,
                    error,
                }),
            }
        }

        for record in &rejected {
            tracing::warn!(kind = ?record.kind, index = record.index, error = %record.error, "rejected training record");
        }

        let habits = HabitTable::build(accepted.iter().copied(), &config.habit);
        let rules = RuleSet::extract(accepted.iter().copied(), &contexts, &config.rules);
        let trained_at = Utc::now();

        let report = TrainingReport {
            accepted_contexts: contexts.len(),
            accepted_interactions: accepted.len(),
            rejected,
            total_habits: habits.len(),
            total_rules: rules.len(),
            generation,
            trained_at,
        };

        tracing::info!(
            generation,
            contexts = report.accepted_contexts,
            interactions = report.accepted_interactions,
            rejected = report.rejected.len(),
            habits = report.total_habits,
            rules = report.total_rules,
            "training pass complete"
        );

        let model = Self {
            config: config.clone(),
            contexts,
            habits,
            rules,
            generation,
            trained_at: Some(trained_at),
        };
        (model, report)
    }

    /// Rank candidate items for a context.
    ///
    /// Returns at most `min(k, candidates)` results, best first.
    pub fn recommend<S: AsRef<str>>(&self, context: &Context, candidates: &[S], k: usize) -> Vec<RecommendationResult> {
        self.ranker().rank(context, candidates, k)
    }

    /// Score one item without ranking.
    pub fn score_item(&self, context: &Context, item_id: &str) -> RecommendationResult {
        self.ranker().score_item(context, item_id)
    }

    /// Summary statistics over the habit table.
    pub fn habit_statistics(&self) -> HabitStatistics {
        HabitStatistics::from_table(&self.habits, self.rules.len())
    }

    /// Project the source context's habits onto the target.
    pub fn transfer_habits(&self, source: &Context, target: &Context) -> Vec<TransferResult> {
        transfer::transfer_habits(&self.habits, source, target)
    }

    /// Feature overlap between two contexts.
    pub fn transfer_overlap(&self, source: &Context, target: &Context) -> TransferOverlap {
        TransferOverlap::between(source, target)
    }

    pub fn similarity(&self, a: &Context, b: &Context) -> f64 {
        similarity::similarity(a, b)
    }

    /// Trained contexts ordered by similarity to `context`, most similar first.
    ///
    /// Ties are broken by context id; the query context itself is skipped.
    pub fn similar_contexts(&self, context: &Context) -> Vec<(&Context, f64)> {
        let mut ranked: Vec<(&Context, f64)> = self
            .contexts
            .values()
            .filter(|other| other.id() != context.id())
            .map(|other| (other, self.similarity(context, other)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id().cmp(b.0.id())));
        ranked
    }

    pub fn habit(&self, context_id: &str, item_id: &str) -> Option<&HabitRecord> {
        self.habits.get(context_id, item_id)
    }

    pub fn habits(&self) -> &HabitTable {
        &self.habits
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rules whose antecedent holds in the context, strongest first.
    pub fn rules_for_context<'a>(&'a self, context: &'a Context) -> Vec<&'a AssociationRule> {
        self.rules.matching(context).collect()
    }

    /// A context seen during training.
    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    /// Every item with at least one habit, sorted.
    pub fn item_ids(&self) -> Vec<String> {
        self.habits.item_ids().into_iter().map(str::to_string).collect()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    pub fn is_trained(&self) -> bool {
        self.trained_at.is_some()
    }

    fn ranker(&self) -> Ranker<'_> {
        Ranker::new(&self.habits, &self.rules, &self.contexts, &self.config.ranking)
    }
}

impl Default for TrainedModel {
    fn default() -> Self {
        Self::empty(EngineConfig::default())
    }
}

/// Owner of the current trained model.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    model: Arc<TrainedModel>,
}

impl Engine {
    /// Create an untrained engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model: Arc::new(TrainedModel::empty(config.clone())),
            config,
        })
    }

    /// Recompute all derived state from the dataset, replacing the old model.
    pub fn train(&mut self, dataset: &Dataset) -> TrainingReport {
        let generation = self.model.generation() + 1;
        let (model, report) = TrainedModel::train_generation(&self.config, dataset, generation);
        self.model = Arc::new(model);
        report
    }

    /// Shared handle to the current model.
    pub fn snapshot(&self) -> Arc<TrainedModel> {
        Arc::clone(&self.model)
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recommend<S: AsRef<str>>(&self, context: &Context, candidates: &[S], k: usize) -> Vec<RecommendationResult> {
        self.model.recommend(context, candidates, k)
    }

    pub fn habit_statistics(&self) -> HabitStatistics {
        self.model.habit_statistics()
    }

    pub fn transfer_habits(&self, source: &Context, target: &Context) -> Vec<TransferResult> {
        self.model.transfer_habits(source, target)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            model: Arc::new(TrainedModel::default()),
        }
    }
}
