//! Feature importance aggregation and ranking.

use crate::node::FeatureIndex;
use crate::tree::DecisionTree;

/// Average per-tree normalized MDI importances, then renormalize to 1.0.
///
/// Trees that never split contribute all zeros.
pub(crate) fn mean_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0f64; n_features];
    for tree in trees {
        for (total, value) in totals.iter_mut().zip(tree.feature_importances()) {
            *total += value;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }
    totals
}

/// A permutation of feature indices ordered by descending importance.
///
/// Equal importances keep ascending feature-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRanking {
    order: Vec<FeatureIndex>,
    importances: Vec<f64>,
}

impl FeatureRanking {
    /// Rank features by the given importance scores, aligned by index.
    #[must_use]
    pub fn from_importances(importances: &[f64]) -> Self {
        let mut order: Vec<FeatureIndex> = (0..importances.len()).map(FeatureIndex::new).collect();
        // Stable sort: ties stay in index order.
        order.sort_by(|a, b| importances[b.index()].total_cmp(&importances[a.index()]));
        Self {
            order,
            importances: importances.to_vec(),
        }
    }

    /// Return every feature, most important first.
    #[must_use]
    pub fn order(&self) -> &[FeatureIndex] {
        &self.order
    }

    /// Return the `k` most important features (all of them if `k` exceeds the count).
    #[must_use]
    pub fn top(&self, k: usize) -> &[FeatureIndex] {
        &self.order[..k.min(self.order.len())]
    }

    /// Return the importance score of `feature`.
    #[must_use]
    pub fn importance(&self, feature: FeatureIndex) -> f64 {
        self.importances[feature.index()]
    }

    /// Return the 1-based rank of `feature`.
    #[must_use]
    pub fn rank_of(&self, feature: FeatureIndex) -> Option<usize> {
        self.order.iter().position(|&f| f == feature).map(|p| p + 1)
    }

    /// Return the number of ranked features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Return `true` when no features are ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
