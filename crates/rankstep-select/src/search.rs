//! Repeated stratified cross-validation over nested top-k feature subsets.

use rankstep_rf::FeatureRanking;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::classifier::{Classifier, TrainedModel};
use crate::dataset::{Dataset, project};
use crate::error::SelectError;
use crate::folds::{Fold, Splitter, StratifiedKFold};
use crate::metric::{Mcc, Scorer};
use crate::result::FeatureStepResult;
use crate::scores::ScoreMatrix;
use crate::steps::FeatureSteps;

/// Feature-step search configuration.
///
/// Construct via [`FeatureStepSearch::new`], then chain `with_*` methods.
///
/// Repetition `r` uses seed `seed + r` for both the fold split and every
/// classifier fit inside that repetition.
#[derive(Debug, Clone)]
pub struct FeatureStepSearch {
    repetitions: usize,
    n_folds: usize,
    steps: FeatureSteps,
    seed: u64,
    parallel: bool,
}

/// Progress report passed to the observer after each repetition.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Zero-based index of the repetition that just finished.
    pub repetition: usize,
    /// Total number of repetitions.
    pub repetitions: usize,
    /// The score matrix with every row up to this repetition written.
    pub scores: &'a ScoreMatrix,
    /// The evaluated feature steps.
    pub steps: &'a FeatureSteps,
}

impl FeatureStepSearch {
    /// Create a search over `steps` with `repetitions` rounds of `n_folds`-fold CV.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::InvalidRepetitionCount`] | `repetitions` is zero |
    /// | [`SelectError::InvalidFoldCount`] | `n_folds` < 2 |
    pub fn new(repetitions: usize, n_folds: usize, steps: FeatureSteps) -> Result<Self, SelectError> {
        if repetitions == 0 {
            return Err(SelectError::InvalidRepetitionCount { repetitions });
        }
        if n_folds < 2 {
            return Err(SelectError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            repetitions,
            n_folds,
            steps,
            seed: 0,
            parallel: false,
        })
    }

    /// Set the base seed. Repetition `r` uses `seed + r`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Evaluate the folds of each repetition concurrently.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Return the number of repetitions.
    #[must_use]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the feature steps.
    #[must_use]
    pub fn steps(&self) -> &FeatureSteps {
        &self.steps
    }

    /// Return the base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether folds run concurrently.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Seed used by repetition `repetition`.
    #[must_use]
    pub fn repetition_seed(&self, repetition: usize) -> u64 {
        self.seed.wrapping_add(repetition as u64)
    }

    /// Run the search with stratified folds and the MCC scorer.
    ///
    /// # Errors
    ///
    /// See [`FeatureStepSearch::evaluate_with`].
    pub fn evaluate<C: Classifier>(
        &self,
        dataset: &Dataset,
        classifier: &C,
    ) -> Result<FeatureStepResult, SelectError> {
        self.evaluate_with(dataset, classifier, &StratifiedKFold, &Mcc, |_| Ok(()))
    }

    /// Run the search with explicit collaborators.
    ///
    /// `observer` is called after every repetition with the partially filled
    /// matrix; an error from it aborts the search.
    ///
    /// Every fold split is computed before the first fit, so input and
    /// partition errors surface without any training.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::FeatureStepOutOfRange`] | a step exceeds the feature count |
    /// | [`SelectError::TooFewSamplesForFolds`] | a class has fewer samples than folds |
    /// | [`SelectError::Classifier`] | a fit or prediction fails |
    /// | [`SelectError::ImportanceCountMismatch`] | a model returns the wrong number of importances |
    /// | [`SelectError::ScoreOutOfRange`] | the scorer returns a value outside [-1, 1] |
    /// | Other | from the splitter, scorer or observer |
    #[instrument(skip_all, fields(
        repetitions = self.repetitions,
        n_folds = self.n_folds,
        n_steps = self.steps.len(),
        n_samples = dataset.n_samples(),
        n_features = dataset.n_features(),
    ))]
    pub fn evaluate_with<C, P, S, O>(
        &self,
        dataset: &Dataset,
        classifier: &C,
        splitter: &P,
        scorer: &S,
        mut observer: O,
    ) -> Result<FeatureStepResult, SelectError>
    where
        C: Classifier,
        P: Splitter,
        S: Scorer,
        O: FnMut(Progress<'_>) -> Result<(), SelectError>,
    {
        self.steps.check_fits(dataset.n_features())?;

        let splits: Vec<Vec<Fold>> = (0..self.repetitions)
            .map(|r| splitter.split(dataset, self.n_folds, self.repetition_seed(r)))
            .collect::<Result<_, _>>()?;
        for folds in &splits {
            check_partition(folds, dataset.n_samples(), self.n_folds)?;
        }

        let mut scores = ScoreMatrix::new(self.repetitions, self.n_folds, self.steps.len())?;

        for (repetition, folds) in splits.iter().enumerate() {
            let ctx = FoldContext {
                dataset,
                classifier,
                scorer,
                steps: &self.steps,
                repetition,
                seed: self.repetition_seed(repetition),
            };

            let rows: Vec<Vec<f64>> = if self.parallel {
                folds
                    .par_iter()
                    .enumerate()
                    .map(|(k, fold)| ctx.evaluate(k, fold))
                    .collect::<Result<_, _>>()?
            } else {
                folds
                    .iter()
                    .enumerate()
                    .map(|(k, fold)| ctx.evaluate(k, fold))
                    .collect::<Result<_, _>>()?
            };

            for (k, row) in rows.iter().enumerate() {
                scores.set_row(scores.row_index(repetition, k), row)?;
            }

            info!(repetition, "repetition completed");
            observer(Progress {
                repetition,
                repetitions: self.repetitions,
                scores: &scores,
                steps: &self.steps,
            })?;
        }

        let result = FeatureStepResult::from_scores(self.steps.clone(), scores)?;
        info!(
            best_step = result.best_step(),
            best_mean = result.best_mean(),
            "feature-step search complete"
        );
        Ok(result)
    }
}

/// Reject splitter output that is not an exact partition into non-empty folds.
///
/// Test sets must cover every sample exactly once across folds, and within a
/// fold `train` must be exactly the complement of `test`.
fn check_partition(folds: &[Fold], n_samples: usize, n_folds: usize) -> Result<(), SelectError> {
    let invalid = |reason: String| Err(SelectError::InvalidPartition { reason });
    if folds.len() != n_folds {
        return invalid(format!("expected {n_folds} folds, got {}", folds.len()));
    }
    let mut held_out = vec![false; n_samples];
    for (k, fold) in folds.iter().enumerate() {
        if fold.test.is_empty() || fold.train.is_empty() {
            return invalid(format!("fold {k} has an empty train or test set"));
        }

        let mut in_fold = vec![false; n_samples];
        for &i in &fold.test {
            if i >= n_samples || held_out[i] {
                return invalid(format!("sample {i} is out of range or held out twice"));
            }
            held_out[i] = true;
            in_fold[i] = true;
        }
        for &i in &fold.train {
            if i >= n_samples {
                return invalid(format!("fold {k} trains on out-of-range sample {i}"));
            }
            if in_fold[i] {
                return invalid(format!("fold {k} trains on sample {i} twice or on its own test set"));
            }
            in_fold[i] = true;
        }
        if let Some(missing) = in_fold.iter().position(|&s| !s) {
            return invalid(format!("fold {k} neither trains nor tests on sample {missing}"));
        }
    }
    if let Some(missing) = held_out.iter().position(|&s| !s) {
        return invalid(format!("sample {missing} is never held out"));
    }
    Ok(())
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything one fold evaluation needs, shared across folds of a repetition.
struct FoldContext<'a, C, S> {
    dataset: &'a Dataset,
    classifier: &'a C,
    scorer: &'a S,
    steps: &'a FeatureSteps,
    repetition: usize,
    seed: u64,
}

impl<C: Classifier, S: Scorer> FoldContext<'_, C, S> {
    fn classifier_error(&self, fold: usize, source: BoxError) -> SelectError {
        SelectError::Classifier {
            repetition: self.repetition,
            fold,
            source,
        }
    }

    /// Rank features on the training folds, then score every step on the held-out fold.
    fn evaluate(&self, fold_index: usize, fold: &Fold) -> Result<Vec<f64>, SelectError> {
        let wrap = |source| self.classifier_error(fold_index, source);

        let (train_x, train_y) = self.dataset.select_rows(&fold.train);
        let (test_x, test_y) = self.dataset.select_rows(&fold.test);

        let model = self
            .classifier
            .fit(&train_x, &train_y, self.seed)
            .map_err(|e| wrap(Box::new(e) as BoxError))?;
        let importances = model.feature_importances();
        if importances.len() != self.dataset.n_features() {
            return Err(SelectError::ImportanceCountMismatch {
                expected: self.dataset.n_features(),
                got: importances.len(),
            });
        }
        let ranking = FeatureRanking::from_importances(&importances);

        let mut row = Vec::with_capacity(self.steps.len());
        for &step in self.steps.as_slice() {
            // Keep the original column order so the full set is ranking-independent.
            let mut columns: Vec<usize> = ranking.top(step).iter().map(|f| f.index()).collect();
            columns.sort_unstable();

            let step_model = self
                .classifier
                .fit(&project(&train_x, &columns), &train_y, self.seed)
                .map_err(|e| wrap(Box::new(e) as BoxError))?;
            let predicted = step_model
                .predict(&project(&test_x, &columns))
                .map_err(|e| wrap(Box::new(e) as BoxError))?;
            if predicted.len() != test_y.len() {
                return Err(SelectError::PredictionCountMismatch {
                    expected: test_y.len(),
                    got: predicted.len(),
                });
            }
            let score = self.scorer.score(&test_y, &predicted)?;
            debug!(fold = fold_index, step, score, "feature step scored");
            row.push(score);
        }

        info!(repetition = self.repetition, fold = fold_index, "fold completed");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use rankstep_rf::RandomForestConfig;

    use super::*;
    use crate::label::Label;

    fn toy_dataset() -> Dataset {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..24 {
            let positive = i % 2 == 0;
            let signal = if positive { 3.0 } else { -3.0 };
            features.push(vec![signal + (i % 5) as f64 * 0.1, (i * 7 % 11) as f64, (i % 3) as f64]);
            labels.push(if positive { Label::Positive } else { Label::Negative });
        }
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn constructor_validation() {
        let steps = FeatureSteps::new(vec![1]).unwrap();
        assert!(matches!(
            FeatureStepSearch::new(0, 5, steps.clone()),
            Err(SelectError::InvalidRepetitionCount { repetitions: 0 })
        ));
        assert!(matches!(
            FeatureStepSearch::new(1, 1, steps),
            Err(SelectError::InvalidFoldCount { n_folds: 1 })
        ));
    }

    #[test]
    fn repetition_seeds_offset_base() {
        let search = FeatureStepSearch::new(3, 2, FeatureSteps::new(vec![1]).unwrap())
            .unwrap()
            .with_seed(10);
        assert_eq!(search.repetition_seed(0), 10);
        assert_eq!(search.repetition_seed(2), 12);
    }

    #[test]
    fn shape_and_range() {
        let search = FeatureStepSearch::new(2, 3, FeatureSteps::new(vec![1, 3]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(10).unwrap();
        let result = search.evaluate(&toy_dataset(), &classifier).unwrap();
        let scores = result.scores();
        assert_eq!(scores.n_rows(), 6);
        assert_eq!(scores.n_columns(), 2);
        assert!(scores.is_complete());
        for r in 0..6 {
            for value in scores.row(r).unwrap() {
                assert!((-1.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn observer_sees_each_repetition() {
        let search = FeatureStepSearch::new(3, 2, FeatureSteps::new(vec![2]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(5).unwrap();
        let mut completed = Vec::new();
        search
            .evaluate_with(&toy_dataset(), &classifier, &StratifiedKFold, &Mcc, |p| {
                completed.push((p.repetition, p.scores.completed_rows()));
                Ok(())
            })
            .unwrap();
        assert_eq!(completed, vec![(0, 2), (1, 4), (2, 6)]);
    }

    #[test]
    fn observer_error_aborts() {
        let search = FeatureStepSearch::new(3, 2, FeatureSteps::new(vec![1]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(5).unwrap();
        let mut calls = 0;
        let err = search
            .evaluate_with(&toy_dataset(), &classifier, &StratifiedKFold, &Mcc, |_| {
                calls += 1;
                Err(SelectError::NoCompletedRows)
            })
            .unwrap_err();
        assert!(matches!(err, SelectError::NoCompletedRows));
        assert_eq!(calls, 1);
    }

    #[test]
    fn infeasible_partition_detected() {
        let search = FeatureStepSearch::new(1, 13, FeatureSteps::new(vec![1]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(5).unwrap();
        let err = search.evaluate(&toy_dataset(), &classifier).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InfeasiblePartition);
    }

    struct BadScorer;

    impl Scorer for BadScorer {
        fn score(&self, _: &[Label], _: &[Label]) -> Result<f64, SelectError> {
            Ok(2.0)
        }
    }

    #[test]
    fn out_of_range_score_rejected() {
        let search = FeatureStepSearch::new(1, 2, FeatureSteps::new(vec![1]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(3).unwrap();
        let err = search
            .evaluate_with(&toy_dataset(), &classifier, &StratifiedKFold, &BadScorer, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(
            err,
            SelectError::ScoreOutOfRange { row: 0, column: 0, value } if value == 2.0
        ));
        assert_eq!(err.kind(), crate::ErrorKind::CollaboratorFailure);
    }

    /// Wraps the stratified splitter and rewrites every training list.
    struct TamperedTrain(fn(&mut Vec<usize>, usize));

    impl Splitter for TamperedTrain {
        fn split(&self, dataset: &Dataset, n_folds: usize, seed: u64) -> Result<Vec<Fold>, SelectError> {
            let mut folds = StratifiedKFold.split(dataset, n_folds, seed)?;
            for fold in &mut folds {
                (self.0)(&mut fold.train, dataset.n_samples());
            }
            Ok(folds)
        }
    }

    fn run_tampered(tamper: fn(&mut Vec<usize>, usize)) -> SelectError {
        let search = FeatureStepSearch::new(1, 3, FeatureSteps::new(vec![1]).unwrap()).unwrap();
        let classifier = RandomForestConfig::new(3).unwrap();
        search
            .evaluate_with(&toy_dataset(), &classifier, &TamperedTrain(tamper), &Mcc, |_| Ok(()))
            .unwrap_err()
    }

    #[test]
    fn out_of_range_train_index_rejected() {
        let err = run_tampered(|train, n| train.push(n + 5));
        assert!(matches!(err, SelectError::InvalidPartition { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::CollaboratorFailure);
    }

    #[test]
    fn train_overlapping_test_rejected() {
        let err = run_tampered(|train, n| *train = (0..n).collect());
        assert!(matches!(err, SelectError::InvalidPartition { .. }));
    }

    #[test]
    fn train_missing_samples_rejected() {
        let err = run_tampered(|train, _| {
            train.pop();
        });
        assert!(matches!(err, SelectError::InvalidPartition { .. }));
    }

    #[test]
    fn duplicate_train_index_rejected() {
        let err = run_tampered(|train, _| {
            let first = train[0];
            train.push(first);
        });
        assert!(matches!(err, SelectError::InvalidPartition { .. }));
    }
}
