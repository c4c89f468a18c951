//! Offline evaluation against a held-out dataset.
//!
//! For every test context the model ranks the candidate items and the top
//! `k` are compared with the items the user rated at or above the
//! relevance threshold in that context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::interaction::Dataset;
use crate::model::TrainedModel;

/// Ranking quality for one test context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEvaluation {
    pub context_id: String,
    /// Items rated at or above the threshold
    pub relevant: Vec<String>,
    /// Top-k item ids returned by the model
    pub recommended: Vec<String>,
    pub hits: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Aggregated evaluation metrics, averaged over evaluated contexts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub contexts_evaluated: usize,
    /// Contexts without relevant items or without a usable definition
    pub skipped_contexts: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    /// Share of contexts with at least one relevant item in the top k
    pub hit_rate: f64,
    pub per_context: Vec<ContextEvaluation>,
}

/// Evaluate a trained model on a test dataset.
///
/// Test contexts are looked up in the test catalog first, then in the
/// model's own catalog. Precision divides by `k`, so short candidate lists
/// are penalized.
pub fn evaluate<S: AsRef<str>>(
    model: &TrainedModel,
    test: &Dataset,
    candidates: &[S],
    k: usize,
    relevance_threshold: f64,
) -> EvaluationReport {
    let mut report = EvaluationReport {
        k,
        ..EvaluationReport::default()
    };
    if k == 0 {
        return report;
    }

    let relevant_by_context = relevant_items(test, relevance_threshold);

    for (context_id, relevant) in relevant_by_context {
        if relevant.is_empty() {
            report.skipped_contexts += 1;
            continue;
        }
        let Some(context) = resolve_context(model, test, context_id) else {
            report.skipped_contexts += 1;
            continue;
        };

        let recommended: Vec<String> = model
            .recommend(context, candidates, k)
            .into_iter()
            .map(|r| r.item_id)
            .collect();
        let hits = recommended
            .iter()
            .filter(|id| relevant.contains(&id.as_str()))
            .count();

        report.per_context.push(ContextEvaluation {
            context_id: context_id.to_string(),
            precision: hits as f64 / k as f64,
            recall: hits as f64 / relevant.len() as f64,
            relevant: relevant.into_iter().map(str::to_string).collect(),
            recommended,
            hits,
        });
    }

    let n = report.per_context.len();
    report.contexts_evaluated = n;
    if n > 0 {
        let n_f = n as f64;
        report.precision_at_k = report.per_context.iter().map(|c| c.precision).sum::<f64>() / n_f;
        report.recall_at_k = report.per_context.iter().map(|c| c.recall).sum::<f64>() / n_f;
        report.hit_rate = report.per_context.iter().filter(|c| c.hits > 0).count() as f64 / n_f;
    }

    tracing::info!(
        k,
        evaluated = report.contexts_evaluated,
        skipped = report.skipped_contexts,
        precision = report.precision_at_k,
        recall = report.recall_at_k,
        "evaluation complete"
    );
    report
}

/// Items per context whose mean test rating reaches the threshold.
fn relevant_items(test: &Dataset, threshold: f64) -> BTreeMap<&str, Vec<&str>> {
    let mut ratings: BTreeMap<&str, BTreeMap<&str, (f64, u64)>> = BTreeMap::new();
    for interaction in &test.interactions {
        if !interaction.rating.is_finite() {
            continue;
        }
        let entry = ratings
            .entry(interaction.context_id.as_str())
            .or_default()
            .entry(interaction.item_id.as_str())
            .or_insert((0.0, 0));
        entry.0 += interaction.rating;
        entry.1 = entry.1.saturating_add(1);
    }

    ratings
        .into_iter()
        .map(|(context_id, items)| {
            let relevant = items
                .into_iter()
                .filter(|(_, (sum, count))| sum / *count as f64 >= threshold)
                .map(|(item_id, _)| item_id)
                .collect();
            (context_id, relevant)
        })
        .collect()
}

fn resolve_context<'a>(model: &'a TrainedModel, test: &'a Dataset, id: &str) -> Option<&'a Context> {
    match test.context(id) {
        Some(context) if context.validate().is_ok() => Some(context),
        Some(_) => None,
        None => model.context(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
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

    fn model() -> TrainedModel {
        let data = Dataset::new(
            vec![context("home_evening", "evening", "home")],
            vec![
                Interaction::new("home_evening", "movie1", 20, 5.0),
                Interaction::new("home_evening", "movie2", 2, 2.0),
                Interaction::new("home_evening", "news", 1, 1.0),
            ],
        );
        TrainedModel::train(&EngineConfig::default(), &data).0
    }

    #[test]
    fn empty_test_set_yields_zeros() {
        let report = evaluate(&model(), &Dataset::default(), &["movie1"], 2, 4.0);
        assert_eq!(report.contexts_evaluated, 0);
        assert_eq!(report.precision_at_k, 0.0);
        assert_eq!(report.recall_at_k, 0.0);
        assert_eq!(report.hit_rate, 0.0);
    }

    #[test]
    fn perfect_top_hit() {
        let test = Dataset::new(
            vec![],
            vec![Interaction::new("home_evening", "movie1", 1, 5.0)],
        );
        let report = evaluate(&model(), &test, &["movie1", "movie2", "news"], 2, 4.0);
        assert_eq!(report.contexts_evaluated, 1);
        assert_eq!(report.per_context[0].recommended[0], "movie1");
        assert_eq!(report.per_context[0].hits, 1);
        assert!((report.precision_at_k - 0.5).abs() < 1e-12);
        assert_eq!(report.recall_at_k, 1.0);
        assert_eq!(report.hit_rate, 1.0);
    }

    #[test]
    fn contexts_without_relevant_items_are_skipped() {
        let test = Dataset::new(
            vec![context("office", "noon", "office")],
            vec![
                Interaction::new("home_evening", "news", 1, 1.0),
                Interaction::new("office", "movie1", 1, 5.0),
                Interaction::new("unknown", "movie1", 1, 5.0),
            ],
        );
        let report = evaluate(&model(), &test, &["movie1", "news"], 1, 4.0);
        // home_evening has nothing relevant, unknown has no definition
        assert_eq!(report.skipped_contexts, 2);
        assert_eq!(report.contexts_evaluated, 1);
        assert_eq!(report.per_context[0].context_id, "office");
    }

    #[test]
    fn zero_k_evaluates_nothing() {
        let test = Dataset::new(
            vec![],
            vec![Interaction::new("home_evening", "movie1", 1, 5.0)],
        );
        let report = evaluate(&model(), &test, &["movie1"], 0, 4.0);
        assert_eq!(report.contexts_evaluated, 0);
        assert_eq!(report.k, 0);
    }
}
