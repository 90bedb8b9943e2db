//! Summary of a feature-step evaluation.

use std::fmt;

use crate::error::SelectError;
use crate::scores::{ScoreMatrix, best_index};
use crate::steps::FeatureSteps;

/// Per-step mean and spread of the scores, and the best step.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStepResult {
    steps: FeatureSteps,
    scores: ScoreMatrix,
    means: Vec<f64>,
    stds: Vec<f64>,
    best_index: usize,
    completed_rows: usize,
}

impl FeatureStepResult {
    /// Summarize the completed rows of `scores`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::StepCountMismatch`] | the matrix width differs from `steps.len()` |
    /// | [`SelectError::NoCompletedRows`] | no row of `scores` is complete |
    pub fn from_scores(steps: FeatureSteps, scores: ScoreMatrix) -> Result<Self, SelectError> {
        if scores.n_columns() != steps.len() {
            return Err(SelectError::StepCountMismatch {
                steps: steps.len(),
                columns: scores.n_columns(),
            });
        }
        let means = scores.column_means()?;
        let stds = scores.column_stds()?;
        let best_index = best_index(&means).ok_or(SelectError::EmptyFeatureSteps)?;
        let completed_rows = scores.completed_rows();
        Ok(Self {
            steps,
            scores,
            means,
            stds,
            best_index,
            completed_rows,
        })
    }

    /// Return the evaluated feature steps.
    #[must_use]
    pub fn steps(&self) -> &FeatureSteps {
        &self.steps
    }

    /// Borrow the full score matrix.
    #[must_use]
    pub fn scores(&self) -> &ScoreMatrix {
        &self.scores
    }

    /// Consume the result, returning the score matrix.
    #[must_use]
    pub fn into_scores(self) -> ScoreMatrix {
        self.scores
    }

    /// Mean score per step, aligned with [`FeatureStepResult::steps`].
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Population standard deviation per step.
    #[must_use]
    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    /// Column index of the best step.
    #[must_use]
    pub fn best_index(&self) -> usize {
        self.best_index
    }

    /// The step with the highest mean score (first one on ties).
    #[must_use]
    pub fn best_step(&self) -> usize {
        self.steps.as_slice()[self.best_index]
    }

    /// The mean score of the best step.
    #[must_use]
    pub fn best_mean(&self) -> f64 {
        self.means[self.best_index]
    }

    /// Number of rows the summary was computed from.
    #[must_use]
    pub fn completed_rows(&self) -> usize {
        self.completed_rows
    }
}

impl fmt::Display for FeatureStepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>10} {:>10}", "features", "mean_mcc", "std_mcc")?;
        for (j, &step) in self.steps.as_slice().iter().enumerate() {
            let marker = if j == self.best_index { " *" } else { "" };
            writeln!(
                f,
                "{step:>8} {:>10.4} {:>10.4}{marker}",
                self.means[j], self.stds[j]
            )?;
        }
        writeln!(
            f,
            "best: {} features, mean MCC {:.4} ({} of {} rows)",
            self.best_step(),
            self.best_mean(),
            self.completed_rows,
            self.scores.n_rows()
        )
    }
}
