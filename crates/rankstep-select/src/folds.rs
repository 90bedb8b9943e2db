//! Stratified k-fold partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;
use crate::error::SelectError;
use crate::label::Label;

/// One train/test split. Both index lists are ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Indices of the samples to train on.
    pub train: Vec<usize>,
    /// Indices of the held-out samples.
    pub test: Vec<usize>,
}

/// Partitions a dataset into cross-validation folds.
pub trait Splitter: Sync {
    /// Split `dataset` into `n_folds` folds, deterministically for a given `seed`.
    ///
    /// The test sets must be disjoint, non-empty and cover every sample.
    ///
    /// # Errors
    ///
    /// Returns an error when the dataset cannot be split into `n_folds` folds.
    fn split(&self, dataset: &Dataset, n_folds: usize, seed: u64) -> Result<Vec<Fold>, SelectError>;
}

/// Stratified k-fold splitter.
///
/// Shuffles each class independently, then deals its samples to the folds
/// round-robin. The deal continues where the previous class stopped, so both
/// the per-class counts and the total fold sizes differ by at most one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StratifiedKFold;

impl StratifiedKFold {
    /// Assign every sample a fold number in `0..n_folds`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::InvalidFoldCount`] | `n_folds` < 2 |
    /// | [`SelectError::TooFewSamplesForFolds`] | a class has fewer samples than folds |
    pub fn assign(&self, labels: &[Label], n_folds: usize, seed: u64) -> Result<Vec<usize>, SelectError> {
        if n_folds < 2 {
            return Err(SelectError::InvalidFoldCount { n_folds });
        }

        let class_indices: Vec<(Label, Vec<usize>)> = Label::ALL
            .iter()
            .map(|&label| {
                let indices = labels
                    .iter()
                    .enumerate()
                    .filter(|&(_, &l)| l == label)
                    .map(|(i, _)| i)
                    .collect();
                (label, indices)
            })
            .collect();

        for (label, indices) in &class_indices {
            if indices.len() < n_folds {
                return Err(SelectError::TooFewSamplesForFolds {
                    label: *label,
                    count: indices.len(),
                    n_folds,
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut assignments = vec![0usize; labels.len()];
        let mut offset = 0;
        for (_, mut indices) in class_indices {
            indices.shuffle(&mut rng);
            for (j, &idx) in indices.iter().enumerate() {
                assignments[idx] = (offset + j) % n_folds;
            }
            offset = (offset + indices.len()) % n_folds;
        }

        Ok(assignments)
    }
}

impl Splitter for StratifiedKFold {
    fn split(&self, dataset: &Dataset, n_folds: usize, seed: u64) -> Result<Vec<Fold>, SelectError> {
        let assignments = self.assign(dataset.labels(), n_folds, seed)?;
        let folds = (0..n_folds)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) = (0..assignments.len()).partition(|&i| assignments[i] == fold);
                Fold { train, test }
            })
            .collect();
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_pos: usize, n_neg: usize) -> Vec<Label> {
        let mut labels = vec![Label::Positive; n_pos];
        labels.extend(vec![Label::Negative; n_neg]);
        labels
    }

    fn dataset(n_pos: usize, n_neg: usize) -> Dataset {
        let labels = labels(n_pos, n_neg);
        let features = (0..labels.len()).map(|i| vec![i as f64]).collect();
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn folds_partition_every_index() {
        let data = dataset(13, 8);
        let folds = StratifiedKFold.split(&data, 4, 7).unwrap();
        assert_eq!(folds.len(), 4);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..21).collect::<Vec<_>>());

        for fold in &folds {
            assert!(!fold.test.is_empty());
            assert_eq!(fold.train.len() + fold.test.len(), 21);
            assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
        }
    }

    #[test]
    fn per_class_counts_within_one() {
        let data = dataset(13, 8);
        let folds = StratifiedKFold.split(&data, 4, 3).unwrap();
        for label in Label::ALL {
            let counts: Vec<usize> = folds
                .iter()
                .map(|f| f.test.iter().filter(|&&i| data.labels()[i] == label).count())
                .collect();
            let max = counts.iter().max().unwrap();
            let min = counts.iter().min().unwrap();
            assert!(max - min <= 1, "{label}: {counts:?}");
        }
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1, "{sizes:?}");
    }

    #[test]
    fn same_seed_same_folds() {
        let data = dataset(10, 10);
        let a = StratifiedKFold.split(&data, 5, 11).unwrap();
        let b = StratifiedKFold.split(&data, 5, 11).unwrap();
        let c = StratifiedKFold.split(&data, 5, 12).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn too_few_samples_for_folds() {
        let err = StratifiedKFold.assign(&labels(2, 6), 3, 0).unwrap_err();
        assert!(matches!(
            err,
            SelectError::TooFewSamplesForFolds {
                label: Label::Positive,
                count: 2,
                n_folds: 3
            }
        ));
    }

    #[test]
    fn invalid_fold_count() {
        assert!(matches!(
            StratifiedKFold.assign(&labels(4, 4), 1, 0),
            Err(SelectError::InvalidFoldCount { n_folds: 1 })
        ));
    }
}
