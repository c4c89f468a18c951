//! Weighted cosine similarity between contexts.
//!
//! Each context is a sparse vector over (dimension, value) tokens: one
//! component per feature, scaled by the feature weight. Two contexts only
//! share a component when they agree on both dimension and value.

use crate::context::{Context, FeatureToken};

/// Cosine similarity in [0, 1].
///
/// Symmetric, 1.0 for a non-degenerate context against itself, 0.0 for
/// disjoint contexts or when either side has only zero weights. Each
/// weight vector is divided by its largest weight first, which leaves the
/// cosine unchanged and keeps every intermediate finite.
pub fn similarity(a: &Context, b: &Context) -> f64 {
    if a.is_degenerate() || b.is_degenerate() {
        return 0.0;
    }
    if same_vector(a, b) {
        return 1.0;
    }

    let (scale_a, scale_b) = (a.max_weight(), b.max_weight());

    // Products are summed in dimension order so (a, b) and (b, a) add the
    // same terms in the same sequence.
    let mut shared: Vec<(&str, f64)> = a
        .features()
        .iter()
        .filter_map(|fa| {
            b.feature(&fa.dimension)
                .filter(|fb| fb.value == fa.value)
                .map(|fb| (fa.dimension.as_str(), (fa.weight / scale_a) * (fb.weight / scale_b)))
        })
        .collect();
    shared.sort_by(|x, y| x.0.cmp(y.0));
    let dot: f64 = shared.iter().map(|(_, product)| product).sum();

    let cosine = dot / (a.relative_norm() * b.relative_norm());
    if cosine.is_finite() {
        cosine.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Tokens shared by both contexts, in dimension order.
pub fn shared_tokens(a: &Context, b: &Context) -> Vec<FeatureToken> {
    a.tokens().into_iter().filter(|t| b.contains(t)).collect()
}

fn same_vector(a: &Context, b: &Context) -> bool {
    a.features().len() == b.features().len()
        && a.features().iter().all(|fa| {
            b.feature(&fa.dimension)
                .is_some_and(|fb| fb.value == fa.value && fb.weight == fa.weight)
        })
}
