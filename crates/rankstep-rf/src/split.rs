use rand::Rng;

use crate::criterion::SplitCriterion;
use crate::data::ColumnData;
use crate::node::FeatureIndex;

/// The best cut found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitCandidate {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) - n_l·I(left) - n_r·I(right)`.
    pub(crate) impurity_decrease: f64,
}

/// Split-search parameters shared by every node of a tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitRules {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

/// Find the best axis-aligned split of `samples`.
///
/// Features are visited in a random order. Search stops once `max_features`
/// features that are non-constant at this node have been scanned, unless no
/// valid split has been found yet, in which case the remaining features are
/// inspected too. Ties keep the first candidate found.
///
/// Returns `None` when no cut satisfies `min_samples_leaf` on every feature.
pub(crate) fn find_best_split(
    data: &ColumnData<'_>,
    samples: &[usize],
    rules: SplitRules,
    rng: &mut impl Rng,
) -> Option<SplitCandidate> {
    let n_samples = samples.len();
    let n_features = data.n_features();
    if n_samples < 2 || n_samples < 2 * rules.min_samples_leaf {
        return None;
    }

    let parent_counts = data.class_counts(samples);
    let parent_impurity = rules.criterion.impurity(&parent_counts, n_samples).value();

    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);
    let mut left_counts = vec![0usize; data.n_classes];
    let mut right_counts = vec![0usize; data.n_classes];

    let mut best: Option<SplitCandidate> = None;
    let mut scanned = 0usize;

    for i in 0..n_features {
        if scanned >= rules.max_features && best.is_some() {
            break;
        }
        // Lazy Fisher-Yates: draw the next feature only when it is needed.
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
        let feature = feature_order[i];
        let column = &data.columns[feature];

        sorted.clear();
        sorted.extend(samples.iter().map(|&s| (column[s], data.labels[s])));
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n_samples - 1].0 {
            continue;
        }
        scanned += 1;

        left_counts.fill(0);
        right_counts.copy_from_slice(&parent_counts);

        for pos in 0..n_samples - 1 {
            let (value, class) = sorted[pos];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next_value = sorted[pos + 1].0;
            if value == next_value {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n_samples - n_left;
            if n_left < rules.min_samples_leaf || n_right < rules.min_samples_leaf {
                continue;
            }

            let left = rules.criterion.impurity(&left_counts, n_left).value();
            let right = rules.criterion.impurity(&right_counts, n_right).value();
            let decrease = n_samples as f64 * parent_impurity
                - n_left as f64 * left
                - n_right as f64 * right;

            if best.is_none_or(|b| decrease > b.impurity_decrease) {
                let mut threshold = value + (next_value - value) / 2.0;
                // Adjacent floats can round the midpoint up onto the right value.
                if threshold >= next_value {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature: FeatureIndex::new(feature),
                    threshold,
                    impurity_decrease: decrease,
                });
            }
        }
    }

    best
}

/// Partition `samples` by a split: `value <= threshold` goes left.
pub(crate) fn partition(
    data: &ColumnData<'_>,
    samples: &[usize],
    split: &SplitCandidate,
) -> (Vec<usize>, Vec<usize>) {
    let column = &data.columns[split.feature.index()];
    samples
        .iter()
        .partition(|&&s| column[s] <= split.threshold)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitRules, find_best_split, partition};
    use crate::criterion::SplitCriterion;
    use crate::data::ColumnData;

    fn rules(max_features: usize, min_samples_leaf: usize) -> SplitRules {
        SplitRules {
            criterion: SplitCriterion::Gini,
            max_features,
            min_samples_leaf,
        }
    }

    #[test]
    fn separable_feature_is_found() {
        let features: Vec<Vec<f64>> = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0]
            .iter()
            .map(|&v| vec![0.0, v])
            .collect();
        let labels = vec![0, 0, 0, 1, 1, 1];
        let data = ColumnData::from_rows(&features, &labels).unwrap();
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // max_features = 1 still reaches feature 1 because feature 0 is constant.
        let split = find_best_split(&data, &samples, rules(1, 1), &mut rng).unwrap();
        assert_eq!(split.feature.index(), 1);
        assert!((split.threshold - 6.5).abs() < 1e-12);
        // 6 * 0.5 - 3 * 0 - 3 * 0
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);

        let (left, right) = partition(&data, &samples, &split);
        assert_eq!(left, vec![0, 1, 2]);
        assert_eq!(right, vec![3, 4, 5]);
    }

    #[test]
    fn constant_features_yield_none() {
        let features = vec![vec![5.0, 1.0]; 4];
        let labels = vec![0, 0, 1, 1];
        let data = ColumnData::from_rows(&features, &labels).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(find_best_split(&data, &[0, 1, 2, 3], rules(2, 1), &mut rng).is_none());
    }

    #[test]
    fn min_samples_leaf_blocks_split() {
        let features = vec![vec![1.0], vec![10.0]];
        let labels = vec![0, 1];
        let data = ColumnData::from_rows(&features, &labels).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(find_best_split(&data, &[0, 1], rules(1, 2), &mut rng).is_none());
    }

    #[test]
    fn repeated_bootstrap_indices_stay_together() {
        let features = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let labels = vec![0, 0, 1, 1];
        let data = ColumnData::from_rows(&features, &labels).unwrap();
        let samples = vec![0, 0, 1, 2, 3, 3];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let split = find_best_split(&data, &samples, rules(1, 1), &mut rng).unwrap();
        let (left, right) = partition(&data, &samples, &split);
        assert_eq!(left, vec![0, 0, 1]);
        assert_eq!(right, vec![2, 3, 3]);
    }
}
