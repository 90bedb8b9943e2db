//! Binary confusion counts and the Matthews correlation coefficient.

use std::fmt;

use crate::error::SelectError;
use crate::label::Label;

/// Scores predictions against truth labels.
pub trait Scorer: Sync {
    /// Return a score in [-1, 1]; higher is better.
    ///
    /// # Errors
    ///
    /// Returns an error when the inputs cannot be scored.
    fn score(&self, truth: &[Label], predicted: &[Label]) -> Result<f64, SelectError>;
}

/// A 2x2 confusion matrix with `Positive` as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryConfusion {
    /// Positives predicted positive.
    pub true_positive: usize,
    /// Negatives predicted negative.
    pub true_negative: usize,
    /// Negatives predicted positive.
    pub false_positive: usize,
    /// Positives predicted negative.
    pub false_negative: usize,
}

impl BinaryConfusion {
    /// Count outcomes from aligned truth and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::PredictionCountMismatch`] | lengths differ |
    /// | [`SelectError::EmptyDataset`] | zero labels |
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Result<Self, SelectError> {
        if truth.len() != predicted.len() {
            return Err(SelectError::PredictionCountMismatch {
                expected: truth.len(),
                got: predicted.len(),
            });
        }
        if truth.is_empty() {
            return Err(SelectError::EmptyDataset);
        }
        let mut counts = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (Label::Positive, Label::Positive) => counts.true_positive += 1,
                (Label::Negative, Label::Negative) => counts.true_negative += 1,
                (Label::Negative, Label::Positive) => counts.false_positive += 1,
                (Label::Positive, Label::Negative) => counts.false_negative += 1,
            }
        }
        Ok(counts)
    }

    /// Return the total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.true_positive + self.true_negative) as f64 / total as f64
        }
    }

    /// Matthews correlation coefficient, 0.0 when any marginal is empty.
    #[must_use]
    pub fn mcc(&self) -> f64 {
        let tp = self.true_positive as f64;
        let tn = self.true_negative as f64;
        let fp = self.false_positive as f64;
        let fn_ = self.false_negative as f64;
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        ((tp * tn - fp * fn_) / denominator).clamp(-1.0, 1.0)
    }
}

impl fmt::Display for BinaryConfusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>7} {:>7}", "", "pred_+1", "pred_-1")?;
        writeln!(
            f,
            "{:>8} {:>7} {:>7}",
            "true_+1", self.true_positive, self.false_negative
        )?;
        writeln!(
            f,
            "{:>8} {:>7} {:>7}",
            "true_-1", self.false_positive, self.true_negative
        )
    }
}

/// Matthews correlation coefficient scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mcc;

impl Scorer for Mcc {
    fn score(&self, truth: &[Label], predicted: &[Label]) -> Result<f64, SelectError> {
        Ok(BinaryConfusion::from_labels(truth, predicted)?.mcc())
    }
}
