//! Symbolic association rules.
//!
//! Mines `IF <context features> THEN <item>` rules from the interaction
//! log. Each accepted interaction record is one transaction whose items are
//! the tokens of its context plus the chosen item.
//!
//! - support    = count(antecedent ∧ item) / total records
//! - confidence = count(antecedent ∧ item) / count(antecedent)
//!
//! Antecedents are single tokens and, with `max_antecedent_len = 2`, pairs
//! of tokens that co-occur in one context. A pair rule is only kept when it
//! is more confident than both of its single-token parts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::context::{Context, FeatureToken};
use crate::interaction::Interaction;

/// An interpretable `IF features THEN item` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    /// Sorted by dimension
    pub antecedent: Vec<FeatureToken>,
    pub consequent: String,
    pub support: f64,
    pub confidence: f64,
    /// Records matching both sides
    pub occurrences: u64,
}

impl AssociationRule {
    /// Whether every antecedent token is present in the context.
    pub fn matches(&self, context: &Context) -> bool {
        !self.antecedent.is_empty() && self.antecedent.iter().all(|t| context.contains(t))
    }

    /// Short pattern label, e.g. `home+evening`.
    pub fn pattern(&self) -> String {
        self.antecedent
            .iter()
            .map(|t| t.value.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let antecedent = self
            .antecedent
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ");
        write!(
            f,
            "IF {} THEN {} (support {:.2}, confidence {:.2})",
            antecedent, self.consequent, self.support, self.confidence
        )
    }
}

/// Rules from one training pass, strongest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<AssociationRule>,
}

fn antecedents_of(tokens: &[FeatureToken], max_len: usize) -> Vec<Vec<FeatureToken>> {
    let mut out: Vec<Vec<FeatureToken>> = tokens.iter().map(|t| vec![t.clone()]).collect();
    if max_len >= 2 {
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                out.push(vec![a.clone(), b.clone()]);
            }
        }
    }
    out
}

impl RuleSet {
    /// Mine rules from validated interactions.
    ///
    /// Interactions whose context is missing from `contexts` are ignored.
    pub fn extract<'a>(
        interactions: impl IntoIterator<Item = &'a Interaction>,
        contexts: &BTreeMap<String, Context>,
        config: &RuleConfig,
    ) -> Self {
        let mut total: u64 = 0;
        let mut antecedent_counts: HashMap<Vec<FeatureToken>, u64> = HashMap::new();
        let mut joint_counts: BTreeMap<(Vec<FeatureToken>, String), u64> = BTreeMap::new();

        for interaction in interactions {
            let Some(context) = contexts.get(&interaction.context_id) else {
                continue;
            };
            total += 1;
            for antecedent in antecedents_of(&context.tokens(), config.max_antecedent_len) {
                *antecedent_counts.entry(antecedent.clone()).or_default() += 1;
                *joint_counts
                    .entry((antecedent, interaction.item_id.clone()))
                    .or_default() += 1;
            }
        }

        if total == 0 {
            return Self::default();
        }

        let confidence_of = |antecedent: &[FeatureToken], item: &str| -> f64 {
            let base = antecedent_counts.get(antecedent).copied().unwrap_or(0);
            if base == 0 {
                return 0.0;
            }
            let joint = joint_counts
                .get(&(antecedent.to_vec(), item.to_string()))
                .copied()
                .unwrap_or(0);
            joint as f64 / base as f64
        };

        let mut rules = Vec::new();
        for ((antecedent, item), &joint) in &joint_counts {
            let support = joint as f64 / total as f64;
            let confidence = confidence_of(antecedent, item);
            if support < config.min_support || confidence < config.min_confidence {
                continue;
            }
            if antecedent.len() > 1 {
                let parent_best = antecedent
                    .iter()
                    .map(|t| confidence_of(std::slice::from_ref(t), item))
                    .fold(0.0_f64, f64::max);
                if confidence <= parent_best {
                    continue;
                }
            }
            rules.push(AssociationRule {
                antecedent: antecedent.clone(),
                consequent: item.clone(),
                support,
                confidence,
                occurrences: joint,
            });
        }

        rules.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.antecedent.len().cmp(&a.antecedent.len()))
                .then_with(|| b.support.total_cmp(&a.support))
                .then_with(|| a.antecedent.cmp(&b.antecedent))
                .then_with(|| a.consequent.cmp(&b.consequent))
        });

        tracing::debug!(records = total, rules = rules.len(), "association rules mined");
        Self { rules }
    }

    /// Rules whose antecedent holds in the context.
    pub fn matching<'a>(&'a self, context: &'a Context) -> impl Iterator<Item = &'a AssociationRule> + 'a {
        self.rules.iter().filter(move |r| r.matches(context))
    }

    /// Strongest rule recommending `item_id` in this context.
    pub fn best_for(&self, context: &Context, item_id: &str) -> Option<&AssociationRule> {
        self.rules
            .iter()
            .find(|r| r.consequent == item_id && r.matches(context))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFeature;

    fn catalog() -> BTreeMap<String, Context> {
        let contexts = vec![
            Context::new(
                "home_evening",
                "Home evening",
                vec![
                    ContextFeature::new("time", "evening"),
                    ContextFeature::new("location", "home"),
                ],
            )
            .unwrap(),
            Context::new(
                "home_morning",
                "Home morning",
                vec![
                    ContextFeature::new("time", "morning"),
                    ContextFeature::new("location", "home"),
                ],
            )
            .unwrap(),
            Context::new(
                "cinema_evening",
                "Cinema evening",
                vec![
                    ContextFeature::new("time", "evening"),
                    ContextFeature::new("location", "cinema"),
                ],
            )
            .unwrap(),
        ];
        contexts
            .into_iter()
            .map(|c| (c.id().to_string(), c))
            .collect()
    }

    fn log() -> Vec<Interaction> {
        vec![
            Interaction::new("home_evening", "movie1", 5, 5.0),
            Interaction::new("home_evening", "movie1", 2, 4.0),
            Interaction::new("home_morning", "news", 3, 4.0),
            Interaction::new("home_morning", "movie1", 1, 3.0),
            Interaction::new("cinema_evening", "movie2", 1, 4.0),
            Interaction::new("cinema_evening", "movie2", 1, 5.0),
        ]
    }

    fn single_feature_config() -> RuleConfig {
        RuleConfig {
            max_antecedent_len: 1,
            ..RuleConfig::default()
        }
    }

    #[test]
    fn computes_support_and_confidence() {
        let rules = RuleSet::extract(&log(), &catalog(), &single_feature_config());
        let home_movie1 = rules
            .iter()
            .find(|r| r.antecedent == vec![FeatureToken::new("location", "home")] && r.consequent == "movie1")
            .unwrap();
        // 4 records at home, 3 of them movie1, out of 6 records.
        assert!((home_movie1.support - 0.5).abs() < 1e-12);
        assert!((home_movie1.confidence - 0.75).abs() < 1e-12);
        assert_eq!(home_movie1.occurrences, 3);
    }

    #[test]
    fn thresholds_filter_weak_rules() {
        let config = RuleConfig {
            min_confidence: 0.8,
            max_antecedent_len: 1,
            ..RuleConfig::default()
        };
        let rules = RuleSet::extract(&log(), &catalog(), &config);
        assert!(rules.iter().all(|r| r.confidence >= 0.8));
        assert!(rules
            .iter()
            .any(|r| r.antecedent == vec![FeatureToken::new("location", "cinema")]));
        assert!(!rules
            .iter()
            .any(|r| r.antecedent == vec![FeatureToken::new("location", "home")]));
    }

    #[test]
    fn pair_rules_only_kept_when_more_confident_than_parts() {
        let rules = RuleSet::extract(&log(), &catalog(), &RuleConfig::default());
        // evening+home -> movie1 is certain, while evening alone is 0.5 and home alone 0.75.
        let pair = rules
            .iter()
            .find(|r| r.antecedent.len() == 2 && r.consequent == "movie1")
            .unwrap();
        assert_eq!(pair.confidence, 1.0);
        assert_eq!(pair.pattern(), "home+evening");
        // cinema already implies movie2, so cinema+evening adds nothing.
        assert!(!rules
            .iter()
            .any(|r| r.antecedent.len() == 2 && r.consequent == "movie2"));
    }

    #[test]
    fn rules_are_sorted_strongest_first() {
        let rules = RuleSet::extract(&log(), &catalog(), &RuleConfig::default());
        let confidences: Vec<f64> = rules.iter().map(|r| r.confidence).collect();
        assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn best_for_requires_full_antecedent_match() {
        let catalog = catalog();
        let rules = RuleSet::extract(&log(), &catalog, &RuleConfig::default());

        let best = rules.best_for(&catalog["home_evening"], "movie1").unwrap();
        assert_eq!(best.antecedent.len(), 2);

        let morning_best = rules.best_for(&catalog["home_morning"], "movie1").unwrap();
        assert_eq!(morning_best.antecedent, vec![FeatureToken::new("location", "home")]);

        assert!(rules.best_for(&catalog["home_morning"], "movie2").is_none());
    }

    #[test]
    fn display_reads_as_if_then() {
        let rules = RuleSet::extract(&log(), &catalog(), &single_feature_config());
        let text = rules.iter().next().unwrap().to_string();
        assert!(text.starts_with("IF "));
        assert!(text.contains(" THEN "));
    }

    #[test]
    fn empty_log_yields_no_rules() {
        let interactions: Vec<Interaction> = Vec::new();
        let rules = RuleSet::extract(&interactions, &catalog(), &RuleConfig::default());
        assert!(rules.is_empty());
    }
}
