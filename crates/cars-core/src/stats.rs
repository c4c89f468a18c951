//! Habit table statistics.
//!
//! `top_habits` aggregates per item by the MAX strength the item reaches in
//! any context, sorted descending with ties broken by item id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::habit::HabitTable;

/// Strongest habit of one item across contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStrength {
    pub item_id: String,
    pub strength: f64,
    /// Context in which the item reaches that strength
    pub context_id: String,
}

/// Summary of a trained habit table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HabitStatistics {
    pub total_habits: usize,
    pub avg_habit_strength: f64,
    pub top_habits: Vec<ItemStrength>,
    pub distinct_contexts: usize,
    pub distinct_items: usize,
    pub total_rules: usize,
}

impl HabitStatistics {
    /// Summarize a habit table; zeroed when it is empty.
    pub fn from_table(habits: &HabitTable, total_rules: usize) -> Self {
        let total_habits = habits.len();
        if total_habits == 0 {
            return Self {
                total_rules,
                ..Self::default()
            };
        }

        let strength_sum: f64 = habits.iter().map(|r| r.strength).sum();

        let mut best: BTreeMap<&str, (f64, &str)> = BTreeMap::new();
        for record in habits.iter() {
            let entry = best
                .entry(record.item_id.as_str())
                .or_insert((record.strength, record.context_id.as_str()));
            if record.strength > entry.0 {
                *entry = (record.strength, record.context_id.as_str());
            }
        }

        let mut top_habits: Vec<ItemStrength> = best
            .into_iter()
            .map(|(item_id, (strength, context_id))| ItemStrength {
                item_id: item_id.to_string(),
                strength,
                context_id: context_id.to_string(),
            })
            .collect();
        top_habits.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        Self {
            total_habits,
            avg_habit_strength: strength_sum / total_habits as f64,
            distinct_contexts: habits.context_ids().count(),
            distinct_items: top_habits.len(),
            top_habits,
            total_rules,
        }
    }

    /// Copy truncated to the `n` strongest items.
    pub fn top(&self, n: usize) -> Self {
        let mut stats = self.clone();
        stats.top_habits.truncate(n);
        stats
    }
}
