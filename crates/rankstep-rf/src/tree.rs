use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    criterion::SplitCriterion,
    data::ColumnData,
    node::{Impurity, Node, NodeIndex},
    split::{SplitRules, find_best_split, partition},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 0                     |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

/// A node waiting to be grown: its arena slot and the samples that reach it.
struct PendingNode {
    slot: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth (root is depth 0). `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the number of features inspected per split. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a decision tree on a row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]`, `labels[sample_idx]` zero-based classes.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                            |
    /// |---------------------------------------|-------------------------------------------------|
    /// | [`RfError::EmptyDataset`]             | `features` is empty                             |
    /// | [`RfError::ZeroFeatures`]             | rows have zero feature columns                  |
    /// | [`RfError::LabelCountMismatch`]       | `labels.len() != features.len()`                |
    /// | [`RfError::FeatureCountMismatch`]     | rows have inconsistent lengths                  |
    /// | [`RfError::NonFiniteValue`]           | any value is NaN or infinite                    |
    /// | [`RfError::InvalidMaxFeatures`]       | `max_features` is outside [1, n_features]       |
    /// | [`RfError::InvalidMaxDepth`]          | `max_depth` is `Some(0)`                        |
    /// | [`RfError::InvalidMinSamplesSplit`]   | `min_samples_split` < 2                         |
    /// | [`RfError::InvalidMinSamplesLeaf`]    | `min_samples_leaf` < 1                          |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let data = ColumnData::from_rows(features, labels)?;
        self.validate()?;
        let max_features = self.max_features.unwrap_or(data.n_features());
        if max_features == 0 || max_features > data.n_features() {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features: data.n_features(),
            });
        }
        let samples: Vec<usize> = (0..data.n_samples()).collect();
        Ok(self.grow(&data, samples, max_features))
    }

    pub(crate) fn validate(&self) -> Result<(), RfError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        Ok(())
    }

    /// Grow a tree depth-first over pre-validated data.
    ///
    /// `samples` may contain repeated indices (a bootstrap draw).
    pub(crate) fn grow(
        &self,
        data: &ColumnData<'_>,
        samples: Vec<usize>,
        max_features: usize,
    ) -> DecisionTree {
        let rules = SplitRules {
            criterion: self.criterion,
            max_features,
            min_samples_leaf: self.min_samples_leaf,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut nodes: Vec<Node> = vec![placeholder()];
        let mut pending = vec![PendingNode {
            slot: 0,
            samples,
            depth: 0,
        }];

        while let Some(PendingNode {
            slot,
            samples,
            depth,
        }) = pending.pop()
        {
            let n_samples = samples.len();
            let counts = data.class_counts(&samples);
            let impurity = self.criterion.impurity(&counts, n_samples);

            let depth_exceeded = self.max_depth.is_some_and(|max_d| depth >= max_d);
            let splittable =
                n_samples >= self.min_samples_split && !impurity.is_pure() && !depth_exceeded;
            let split = if splittable {
                find_best_split(data, &samples, rules, &mut rng)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[slot] = leaf(&counts, impurity, n_samples);
                continue;
            };

            let (left_samples, right_samples) = partition(data, &samples, &split);
            let left = NodeIndex::new(nodes.len());
            nodes.push(placeholder());
            let right = NodeIndex::new(nodes.len());
            nodes.push(placeholder());

            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                n_samples,
                impurity_decrease: split.impurity_decrease,
            };

            // Right is pushed first so the left subtree is grown first.
            pending.push(PendingNode {
                slot: right.index(),
                samples: right_samples,
                depth: depth + 1,
            });
            pending.push(PendingNode {
                slot: left.index(),
                samples: left_samples,
                depth: depth + 1,
            });
        }

        debug!(n_nodes = nodes.len(), "decision tree grown");

        DecisionTree {
            nodes,
            n_features: data.n_features(),
            n_classes: data.n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder() -> Node {
    Node::Leaf {
        prediction: 0,
        distribution: Vec::new(),
        impurity: Impurity::new(0.0),
        n_samples: 0,
    }
}

fn leaf(counts: &[usize], impurity: Impurity, n_samples: usize) -> Node {
    let total = n_samples.max(1) as f64;
    let distribution = counts.iter().map(|&c| c as f64 / total).collect();
    // First maximum wins, so ties resolve to the lowest class index.
    let prediction = counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (class, &count)| {
            if count > best.1 { (class, count) } else { best }
        })
        .0;
    Node::Leaf {
        prediction,
        distribution,
        impurity,
        n_samples,
    }
}

/// A fitted CART decision tree stored as a node arena.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.check_width(sample)?;
        match self.leaf_for(sample) {
            Node::Leaf { prediction, .. } => Ok(*prediction),
            Node::Split { .. } => unreachable!("leaf_for always ends at a leaf"),
        }
    }

    /// Return the class distribution of the leaf reached by `sample`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        self.check_width(sample)?;
        match self.leaf_for(sample) {
            Node::Leaf { distribution, .. } => Ok(distribution),
            Node::Split { .. } => unreachable!("leaf_for always ends at a leaf"),
        }
    }

    /// Mean Decrease in Impurity per feature, normalized to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    fn leaf_for(&self, sample: &[f64]) -> &Node {
        let mut node = &self.nodes[0];
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = node
        {
            let next = if sample[feature.index()] <= *threshold {
                left
            } else {
                right
            };
            node = &self.nodes[next.index()];
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        (features, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let labels = vec![1, 1, 1];
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&[2.0, 3.0]).unwrap(), 1);
        assert!(tree.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn linearly_separable_correct_split() {
        let (features, labels) = separable();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&[2.0, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[11.0, 0.0]).unwrap(), 1);
        assert_eq!(tree.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn xor_needs_depth_at_least_2() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = vec![0, 1, 1, 0];
        let tree = DecisionTreeConfig::new().with_seed(3).fit(&features, &labels).unwrap();
        assert!(tree.depth() >= 2);
        for (sample, &label) in features.iter().zip(&labels) {
            assert_eq!(tree.predict(sample).unwrap(), label);
        }
    }

    #[test]
    fn max_depth_limits_tree() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = vec![0, 1, 1, 0];
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels)
            .unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn predict_proba_sums_to_one() {
        let (features, labels) = separable();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels)
            .unwrap();
        let proba = tree.predict_proba(&[5.0, 0.0]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tied_leaf_predicts_lowest_class() {
        let features = vec![vec![1.0], vec![1.0]];
        let labels = vec![1, 0];
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.predict(&[1.0]).unwrap(), 0);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let features: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 7) as f64, (i % 5) as f64, (i % 3) as f64])
            .collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i % 7 > 2)).collect();
        let config = DecisionTreeConfig::new().with_max_features(Some(1)).with_seed(11);
        let a = config.fit(&features, &labels).unwrap();
        let b = config.fit(&features, &labels).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert_eq!(a.n_nodes(), b.n_nodes());
    }

    #[test]
    fn config_validation_errors() {
        let (features, labels) = separable();
        let err = DecisionTreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxDepth { .. }));

        let err = DecisionTreeConfig::new()
            .with_min_samples_split(1)
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMinSamplesSplit { .. }));

        let err = DecisionTreeConfig::new()
            .with_max_features(Some(3))
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::InvalidMaxFeatures {
                max_features: 3,
                n_features: 2
            }
        ));
    }

    #[test]
    fn prediction_feature_mismatch() {
        let (features, labels) = separable();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }
}
