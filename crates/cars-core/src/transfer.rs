//! Compositional habit transfer.
//!
//! Contexts are decomposed into atomic (dimension, value) tokens; the
//! overlap between source and target is captured by their cosine
//! similarity, and every source habit is projected onto the target as
//! `transfer_score = H_source × similarity(source, target)`.
//!
//! Nothing is learned about the target: items without a source habit are
//! never produced.

use serde::{Deserialize, Serialize};

use crate::context::{Context, FeatureToken};
use crate::habit::HabitTable;
use crate::similarity::{shared_tokens, similarity};

/// Projected habit strength of one item in the target context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub item_id: String,
    pub transfer_score: f64,
    /// Habit strength under the source context
    pub source_strength: f64,
}

/// Feature-level decomposition of a source/target pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOverlap {
    pub similarity: f64,
    pub shared: Vec<FeatureToken>,
    pub source_only: Vec<FeatureToken>,
    pub target_only: Vec<FeatureToken>,
}

impl TransferOverlap {
    pub fn between(source: &Context, target: &Context) -> Self {
        Self {
            similarity: similarity(source, target),
            shared: shared_tokens(source, target),
            source_only: source
                .tokens()
                .into_iter()
                .filter(|t| !target.contains(t))
                .collect(),
            target_only: target
                .tokens()
                .into_iter()
                .filter(|t| !source.contains(t))
                .collect(),
        }
    }
}

/// Project every source habit onto the target, highest score first.
///
/// Ties are broken by item id. Returns an empty list when the source
/// context has no trained habits.
pub fn transfer_habits(habits: &HabitTable, source: &Context, target: &Context) -> Vec<TransferResult> {
    let sim = similarity(source, target);

    let mut results: Vec<TransferResult> = habits
        .for_context(source.id())
        .map(|record| TransferResult {
            item_id: record.item_id.clone(),
            transfer_score: record.strength * sim,
            source_strength: record.strength,
        })
        .collect();

    results.sort_by(|a, b| {
        b.transfer_score
            .total_cmp(&a.transfer_score)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });

    tracing::debug!(
        source = source.id(),
        target = target.id(),
        similarity = sim,
        items = results.len(),
        "transferred habits"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HabitConfig;
    use crate::context::ContextFeature;
    use crate::interaction::Interaction;

    fn context(id: &str, time: &str, location: &str) -> Context {
        Context::new(
            id,
            id,
            vec![
                ContextFeature::new("time", time),
                ContextFeature::new("location", location),
            ],
        )
        .unwrap()
    }

    fn table() -> HabitTable {
        HabitTable::build(
            &[
                Interaction::new("home_evening", "movie1", 10, 4.5),
                Interaction::new("home_evening", "movie2", 1, 2.0),
                Interaction::new("work_noon", "podcast", 4, 3.0),
            ],
            &HabitConfig::default(),
        )
    }

    #[test]
    fn self_transfer_reproduces_strengths() {
        let habits = table();
        let src = context("home_evening", "evening", "home");
        let results = transfer_habits(&habits, &src, &src);
        assert_eq!(results.len(), 2);
        for r in &results {
            let h = habits.get("home_evening", &r.item_id).unwrap().strength;
            assert_eq!(r.transfer_score, h);
        }
    }

    #[test]
    fn partial_overlap_scales_between_zero_and_source() {
        let habits = table();
        let src = context("home_evening", "evening", "home");
        let dst = context("home_morning", "morning", "home");
        let results = transfer_habits(&habits, &src, &dst);
        let movie1 = results.iter().find(|r| r.item_id == "movie1").unwrap();
        assert!(movie1.transfer_score > 0.0);
        assert!(movie1.transfer_score < movie1.source_strength);
        assert_eq!(results[0].item_id, "movie1");
    }

    #[test]
    fn disjoint_target_keeps_items_with_zero_score() {
        let habits = table();
        let src = context("home_evening", "evening", "home");
        let dst = context("gym_morning", "morning", "gym");
        let results = transfer_habits(&habits, &src, &dst);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.transfer_score == 0.0));
    }

    #[test]
    fn untrained_source_transfers_nothing() {
        let habits = table();
        let src = context("car_night", "night", "car");
        let dst = context("home_evening", "evening", "home");
        assert!(transfer_habits(&habits, &src, &dst).is_empty());
    }

    #[test]
    fn overlap_splits_tokens() {
        let src = context("home_evening", "evening", "home");
        let dst = context("home_morning", "morning", "home");
        let overlap = TransferOverlap::between(&src, &dst);
        assert_eq!(overlap.shared, vec![FeatureToken::new("location", "home")]);
        assert_eq!(overlap.source_only, vec![FeatureToken::new("time", "evening")]);
        assert_eq!(overlap.target_only, vec![FeatureToken::new("time", "morning")]);
        assert!((overlap.similarity - 0.5).abs() < 1e-12);
    }
}
