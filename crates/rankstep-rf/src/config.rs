//! Configuration builder for Random Forest training.

use crate::criterion::SplitCriterion;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Strategy for the number of features inspected at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of the feature count, rounded up.
    Sqrt,
    /// Log base 2 of the feature count, rounded up (at least 1).
    Log2,
    /// A fraction of the feature count in (0.0, 1.0], rounded up.
    Fraction(f64),
    /// A fixed count, clamped to the feature count.
    Fixed(usize),
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for a dataset with `n_features` columns.
    ///
    /// `Fixed` is clamped to `n_features` so the same configuration can be
    /// fitted on feature subsets of any width.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] when the strategy resolves to 0
    /// or a fraction is outside (0.0, 1.0].
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let resolved = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil().max(1.0) as usize,
            MaxFeatures::Fraction(f) if f > 0.0 && f <= 1.0 => {
                (n_features as f64 * f).ceil() as usize
            }
            MaxFeatures::Fraction(_) => 0,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default  |
/// |---------------------|----------|
/// | `max_features`      | `Sqrt`   |
/// | `max_depth`         | `None`   |
/// | `min_samples_split` | 2        |
/// | `min_samples_leaf`  | 1        |
/// | `criterion`         | `Gini`   |
/// | `seed`              | 0        |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            seed: 0,
        })
    }

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
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

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the master seed from which bootstrap draws and per-tree seeds derive.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]` row-major, `labels[sample_idx]`
    /// zero-based classes.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                             |
    /// |-------------------------------------|--------------------------------------------------|
    /// | [`RfError::EmptyDataset`]           | `features` is empty                              |
    /// | [`RfError::ZeroFeatures`]           | rows have zero feature columns                   |
    /// | [`RfError::LabelCountMismatch`]     | `labels.len() != features.len()`                 |
    /// | [`RfError::FeatureCountMismatch`]   | rows have inconsistent lengths                   |
    /// | [`RfError::NonFiniteValue`]         | any value is NaN or infinite                     |
    /// | [`RfError::InvalidMaxFeatures`]     | `max_features` resolves outside [1, n_features]  |
    /// | [`RfError::InvalidMaxDepth`]        | `max_depth` is `Some(0)`                         |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 2                          |
    /// | [`RfError::InvalidMinSamplesLeaf`]  | `min_samples_leaf` < 1                           |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<RandomForest, RfError> {
        crate::forest::train(self, features, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_strategies() {
        assert_eq!(MaxFeatures::Sqrt.resolve(20).unwrap(), 5);
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Log2.resolve(10).unwrap(), 4);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5).unwrap(), 3);
        assert_eq!(MaxFeatures::Fixed(8).resolve(3).unwrap(), 3);
        assert_eq!(MaxFeatures::All.resolve(7).unwrap(), 7);
    }

    #[test]
    fn resolve_rejects_degenerate() {
        assert!(MaxFeatures::Fixed(0).resolve(4).is_err());
        assert!(MaxFeatures::Fraction(0.0).resolve(4).is_err());
        assert!(MaxFeatures::Fraction(1.5).resolve(4).is_err());
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn builder_round_trip() {
        let config = RandomForestConfig::new(25)
            .unwrap()
            .with_max_features(MaxFeatures::Log2)
            .with_max_depth(Some(4))
            .with_min_samples_split(3)
            .with_min_samples_leaf(2)
            .with_criterion(SplitCriterion::Entropy)
            .with_seed(9);
        assert_eq!(config.n_trees(), 25);
        assert_eq!(config.max_features(), MaxFeatures::Log2);
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.min_samples_split(), 3);
        assert_eq!(config.min_samples_leaf(), 2);
        assert_eq!(config.criterion(), SplitCriterion::Entropy);
        assert_eq!(config.seed(), 9);
    }
}
