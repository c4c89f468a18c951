//! Recommendation ranking.
//!
//! Every candidate is scored from three signals:
//!
//! | Signal  | Source                                              |
//! |---------|-----------------------------------------------------|
//! | direct  | habit strength in the exact query context            |
//! | similar | similarity-weighted habit strength in other contexts |
//! | rule    | confidence of the strongest matching rule            |
//!
//! ```text
//! score   = dw·direct + iw·similar + rw·rule          (missing signal = 0)
//! similar = (Σ sim·H / Σ sim) × max sim
//! ```
//!
//! Config validation keeps `dw + iw + rw <= 1` and `dw >= iw + rw`, so the
//! score stays in [0, 1] and an item with no evidence scores exactly 0.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::context::Context;
use crate::habit::{HabitRecord, HabitTable};
use crate::rules::{AssociationRule, RuleSet};
use crate::similarity::similarity;

/// Evidence source behind a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Habit recorded in the exact context
    Direct,
    /// Habits from similar trained contexts
    Similar,
    /// Matching association rule
    Rule,
    /// No evidence at all
    NoEvidence,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Direct => "direct",
            Signal::Similar => "similar",
            Signal::Rule => "rule",
            Signal::NoEvidence => "none",
        };
        f.write_str(s)
    }
}

/// One weighted signal in a score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTerm {
    pub signal: Signal,
    /// Blending weight (0.0 to 1.0)
    pub weight: f64,
    /// Raw signal value (0.0 to 1.0)
    pub score: f64,
    /// weight × score
    pub contribution: f64,
}

impl SignalTerm {
    pub fn new(signal: Signal, weight: f64, score: f64) -> Self {
        let weight = weight.clamp(0.0, 1.0);
        let score = score.clamp(0.0, 1.0);
        Self {
            signal,
            weight,
            score,
            contribution: weight * score,
        }
    }
}

/// A ranked candidate with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub item_id: String,
    /// Composite score, clamped to [0, 1]
    pub score: f64,
    pub explanation: String,
    /// Signal with the largest contribution
    pub dominant: Signal,
    pub breakdown: Vec<SignalTerm>,
}

/// Similarity-weighted evidence gathered from other contexts.
#[derive(Debug, Clone, PartialEq)]
struct IndirectEvidence<'a> {
    estimate: f64,
    closest: &'a Context,
    closest_similarity: f64,
    contexts_used: usize,
}

/// Scores candidates against a trained habit table and rule set.
pub struct Ranker<'a> {
    habits: &'a HabitTable,
    rules: &'a RuleSet,
    contexts: &'a BTreeMap<String, Context>,
    config: &'a RankingConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(
        habits: &'a HabitTable,
        rules: &'a RuleSet,
        contexts: &'a BTreeMap<String, Context>,
        config: &'a RankingConfig,
    ) -> Self {
        Self {
            habits,
            rules,
            contexts,
            config,
        }
    }

    /// Rank candidates for the context, best first, at most `k` results.
    ///
    /// Duplicate candidate ids keep their first occurrence. Ties on score
    /// are broken by item id.
    pub fn rank<S: AsRef<str>>(&self, context: &Context, candidates: &[S], k: usize) -> Vec<RecommendationResult> {
        if k == 0 || candidates.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        let mut results: Vec<RecommendationResult> = candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| seen.insert(*id))
            .map(|item_id| self.score_item(context, item_id))
            .filter(|r| !self.config.non_zero_only || r.score > 0.0)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        results.truncate(k);

        tracing::debug!(
            context = context.id(),
            candidates = candidates.len(),
            returned = results.len(),
            "ranked candidates"
        );
        results
    }

    /// Score a single item in the context.
    pub fn score_item(&self, context: &Context, item_id: &str) -> RecommendationResult {
        let direct = self.habits.get(context.id(), item_id);
        let indirect = self.indirect_evidence(context, item_id);
        let rule = self.rules.best_for(context, item_id);

        let breakdown = vec![
            SignalTerm::new(
                Signal::Direct,
                self.config.direct_weight,
                direct.map_or(0.0, |r| r.strength),
            ),
            SignalTerm::new(
                Signal::Similar,
                self.config.indirect_weight,
                indirect.as_ref().map_or(0.0, |e| e.estimate),
            ),
            SignalTerm::new(
                Signal::Rule,
                self.config.rule_weight,
                rule.map_or(0.0, |r| r.confidence),
            ),
        ];

        let total: f64 = breakdown.iter().map(|t| t.contribution).sum();
        let score = total.clamp(0.0, 1.0);
        let dominant = dominant_signal(&breakdown);
        let explanation = explain(dominant, &breakdown, direct, indirect.as_ref(), rule);

        RecommendationResult {
            item_id: item_id.to_string(),
            score,
            explanation,
            dominant,
            breakdown,
        }
    }

    fn indirect_evidence(&self, context: &Context, item_id: &str) -> Option<IndirectEvidence<'a>> {
        let mut weighted_sum = 0.0;
        let mut similarity_sum = 0.0;
        let mut closest: Option<(&'a Context, f64)> = None;
        let mut contexts_used = 0;

        for record in self.habits.for_item(item_id) {
            if record.context_id == context.id() {
                continue;
            }
            let Some(other) = self.contexts.get(&record.context_id) else {
                continue;
            };
            let sim = similarity(context, other);
            if sim <= self.config.min_similarity || sim <= 0.0 {
                continue;
            }
            weighted_sum += sim * record.strength;
            similarity_sum += sim;
            contexts_used += 1;
            if closest.map_or(true, |(_, best)| sim > best) {
                closest = Some((other, sim));
            }
        }

        let (closest, closest_similarity) = closest?;
        if similarity_sum <= 0.0 {
            return None;
        }
        Some(IndirectEvidence {
            estimate: (weighted_sum / similarity_sum) * closest_similarity,
            closest,
            closest_similarity,
            contexts_used,
        })
    }
}

fn dominant_signal(breakdown: &[SignalTerm]) -> Signal {
    let mut best: Option<&SignalTerm> = None;
    for term in breakdown {
        if term.contribution > best.map_or(0.0, |b| b.contribution) {
            best = Some(term);
        }
    }
    best.map_or(Signal::NoEvidence, |t| t.signal)
}

fn strength_label(strength: f64) -> &'static str {
    if strength >= 0.7 {
        "strong"
    } else if strength >= 0.4 {
        "moderate"
    } else {
        "weak"
    }
}

fn explain(
    dominant: Signal,
    breakdown: &[SignalTerm],
    direct: Option<&HabitRecord>,
    indirect: Option<&IndirectEvidence<'_>>,
    rule: Option<&AssociationRule>,
) -> String {
    let primary = match (dominant, direct, indirect, rule) {
        (Signal::Direct, Some(record), _, _) => format!(
            "{} habit in this exact context (strength {:.2}, chosen {}x)",
            strength_label(record.strength),
            record.strength,
            record.repetition
        ),
        (Signal::Similar, _, Some(evidence), _) => format!(
            "similar context transfer from '{}' (similarity {:.2}, {} context{})",
            evidence.closest.name(),
            evidence.closest_similarity,
            evidence.contexts_used,
            if evidence.contexts_used == 1 { "" } else { "s" }
        ),
        (Signal::Rule, _, _, Some(rule)) => format!(
            "rule-based: {} pattern (confidence {:.2})",
            rule.pattern(),
            rule.confidence
        ),
        _ => return "no habit, similarity or rule evidence for this context".to_string(),
    };

    let supporting: Vec<String> = breakdown
        .iter()
        .filter(|t| t.signal != dominant && t.contribution > 0.0)
        .map(|t| match (t.signal, rule) {
            (Signal::Rule, Some(rule)) => format!("rule {}", rule.pattern()),
            (Signal::Similar, _) => "similar contexts".to_string(),
            (signal, _) => format!("{signal} habit"),
        })
        .collect();

    if supporting.is_empty() {
        primary
    } else {
        format!("{primary}; corroborated by {}", supporting.join(", "))
    }
}
