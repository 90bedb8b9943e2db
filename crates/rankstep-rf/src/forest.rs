//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::config::RandomForestConfig;
use crate::data::ColumnData;
use crate::error::RfError;
use crate::importance::{FeatureRanking, mean_importances};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl RandomForest {
    /// Mean Decrease in Impurity per feature, averaged over trees.
    ///
    /// Aligned by feature index and normalized to sum to 1.0; all zeros when
    /// no tree made a split.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        mean_importances(&self.trees, self.n_features)
    }

    /// Rank features by descending importance.
    #[must_use]
    pub fn feature_ranking(&self) -> FeatureRanking {
        FeatureRanking::from_importances(&self.feature_importances())
    }

    /// Borrow the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

/// Draw `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<RandomForest, RfError> {
    let data = ColumnData::from_rows(features, labels)?;
    let n_samples = data.n_samples();
    let n_features = data.n_features();
    let max_features = config.max_features.resolve(n_features)?;

    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_config.validate()?;

    debug!(
        n_samples,
        n_features,
        n_classes = data.n_classes,
        max_features,
        "training random forest"
    );

    // Per-tree seeds come from one master stream, so results do not depend
    // on how rayon schedules the trees.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = bootstrap_sample(n_samples, &mut rng);
            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .grow(&data, samples, max_features)
        })
        .collect();

    debug!(n_trees = trees.len(), "random forest trained");

    Ok(RandomForest {
        trees,
        n_features,
        n_classes: data.n_classes,
    })
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::criterion::SplitCriterion;

    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            features.push(vec![i as f64 * 0.15, 0.5, (i % 4) as f64]);
            labels.push(0);
        }
        for i in 0..20 {
            features.push(vec![10.0 + i as f64 * 0.15, 0.5, (i % 4) as f64]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn separable_training_accuracy() {
        let (features, labels) = make_separable_data();
        let forest = RandomForestConfig::new(30)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap();
        let predictions = forest.predict_batch(&features).unwrap();
        assert_eq!(predictions, labels);
        assert_eq!(forest.n_trees(), 30);
    }

    #[test]
    fn importances_sum_to_one_and_rank_signal_first() {
        let (features, labels) = make_separable_data();
        let forest = RandomForestConfig::new(20)
            .unwrap()
            .with_seed(5)
            .fit(&features, &labels)
            .unwrap();
        let importances = forest.feature_importances();
        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        assert_eq!(forest.feature_ranking().order()[0].index(), 0);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        let config = RandomForestConfig::new(15)
            .unwrap()
            .with_criterion(SplitCriterion::Entropy)
            .with_seed(99);
        let a = config.fit(&features, &labels).unwrap();
        let b = config.fit(&features, &labels).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert_eq!(
            a.predict_proba_batch(&features).unwrap().iter().map(|d| d.as_slice().to_vec()).collect::<Vec<_>>(),
            b.predict_proba_batch(&features).unwrap().iter().map(|d| d.as_slice().to_vec()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let err = config.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, crate::RfError::EmptyDataset));
    }

    #[test]
    fn invalid_leaf_size_error() {
        let (features, labels) = make_separable_data();
        let err = RandomForestConfig::new(3)
            .unwrap()
            .with_min_samples_leaf(0)
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, crate::RfError::InvalidMinSamplesLeaf { .. }));
    }
}
