//! Habit strength model.
//!
//! Habit strength for a (context, item) pair is
//!
//! ```text
//! H = α·R' + β·PR
//! R' = ln(R + 1) / ln(CAP + 1)     (repetition, diminishing returns)
//! PR = rating / rating_max          (positive reinforcement)
//! ```
//!
//! Both terms and the result are clamped to [0, 1]. Pairs with no observed
//! interaction have no record at all, which is different from a zero-strength
//! record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::HabitConfig;
use crate::interaction::Interaction;

/// Log-compressed repetition term in [0, 1].
pub fn repetition_term(repetition: u32, cap: u32) -> f64 {
    if cap == 0 {
        return if repetition > 0 { 1.0 } else { 0.0 };
    }
    let value = (repetition as f64 + 1.0).ln() / (cap as f64 + 1.0).ln();
    value.clamp(0.0, 1.0)
}

/// Rating normalized onto [0, 1].
pub fn reinforcement_term(rating: f64, rating_max: f64) -> f64 {
    if rating_max <= 0.0 || !rating.is_finite() {
        return 0.0;
    }
    (rating / rating_max).clamp(0.0, 1.0)
}

/// Combined habit strength in [0, 1].
pub fn habit_strength(config: &HabitConfig, repetition: u32, rating: f64) -> f64 {
    let r = repetition_term(repetition, config.repetition_cap);
    let pr = reinforcement_term(rating, config.rating_max);
    (config.alpha * r + config.beta * pr).clamp(0.0, 1.0)
}

/// Derived habit for one (context, item) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub context_id: String,
    pub item_id: String,
    /// Total repetitions across all interactions for the pair
    pub repetition: u32,
    /// Mean rating on [0, 1]
    pub normalized_reinforcement: f64,
    /// Habit strength on [0, 1]
    pub strength: f64,
}

impl HabitRecord {
    pub fn compute(
        context_id: impl Into<String>,
        item_id: impl Into<String>,
        repetition: u32,
        mean_rating: f64,
        config: &HabitConfig,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            item_id: item_id.into(),
            repetition,
            normalized_reinforcement: reinforcement_term(mean_rating, config.rating_max),
            strength: habit_strength(config, repetition, mean_rating),
        }
    }
}

#[derive(Default)]
struct PairAccumulator {
    repetition: u32,
    rating_sum: f64,
    observations: u64,
}

impl PairAccumulator {
    fn add(&mut self, interaction: &Interaction) {
        self.repetition = self.repetition.saturating_add(interaction.repetition_count);
        self.rating_sum += interaction.rating;
        self.observations = self.observations.saturating_add(1);
    }

    fn mean_rating(&self) -> f64 {
        self.rating_sum / self.observations.max(1) as f64
    }
}

/// Habit records keyed by context, then item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitTable {
    records: BTreeMap<String, BTreeMap<String, HabitRecord>>,
}

impl HabitTable {
    /// Aggregate already-validated interactions into habit records.
    pub fn build<'a>(
        interactions: impl IntoIterator<Item = &'a Interaction>,
        config: &HabitConfig,
    ) -> Self {
        let mut pairs: BTreeMap<(&str, &str), PairAccumulator> = BTreeMap::new();
        for interaction in interactions {
            pairs
                .entry((interaction.context_id.as_str(), interaction.item_id.as_str()))
                .or_default()
                .add(interaction);
        }

        let mut records: BTreeMap<String, BTreeMap<String, HabitRecord>> = BTreeMap::new();
        for ((context_id, item_id), acc) in pairs {
            let record =
                HabitRecord::compute(context_id, item_id, acc.repetition, acc.mean_rating(), config);
            records
                .entry(context_id.to_string())
                .or_default()
                .insert(item_id.to_string(), record);
        }
        Self { records }
    }

    pub fn get(&self, context_id: &str, item_id: &str) -> Option<&HabitRecord> {
        self.records.get(context_id)?.get(item_id)
    }

    /// Records under one context, ordered by item id.
    pub fn for_context<'a>(&'a self, context_id: &str) -> impl Iterator<Item = &'a HabitRecord> + 'a {
        self.records
            .get(context_id)
            .into_iter()
            .flat_map(|items| items.values())
    }

    /// Records for one item across contexts, ordered by context id.
    pub fn for_item<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = &'a HabitRecord> + 'a {
        self.records
            .values()
            .filter_map(move |items| items.get(item_id))
    }

    /// All records, ordered by (context id, item id).
    pub fn iter(&self) -> impl Iterator<Item = &HabitRecord> {
        self.records.values().flat_map(|items| items.values())
    }

    pub fn context_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn item_ids(&self) -> BTreeSet<&str> {
        self.iter().map(|r| r.item_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
