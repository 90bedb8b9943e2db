use std::path::PathBuf;

use crate::label::Label;

/// Coarse classification of a [`SelectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed dataset, inconsistent shapes, degenerate labels or bad parameters.
    InvalidInput,
    /// Stratification cannot give every fold a sample of every class.
    InfeasiblePartition,
    /// The classifier or scorer failed or returned unusable output.
    CollaboratorFailure,
    /// Reading or writing a score file failed.
    Persistence,
}

/// Errors from feature-step evaluation.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// Returned when the repetition count is zero.
    #[error("repetitions must be at least 1, got {repetitions}")]
    InvalidRepetitionCount {
        /// The invalid repetition count.
        repetitions: usize,
    },

    /// Returned when the fold count is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        n_folds: usize,
    },

    /// Returned when no feature steps were given.
    #[error("feature steps must not be empty")]
    EmptyFeatureSteps,

    /// Returned when a feature step is zero.
    #[error("feature step at position {position} is zero")]
    ZeroFeatureStep {
        /// Zero-based position of the step in the sequence.
        position: usize,
    },

    /// Returned when feature steps are not strictly ascending.
    #[error("feature step {step} at position {position} does not exceed previous step {previous}")]
    StepsNotAscending {
        /// Zero-based position of the offending step.
        position: usize,
        /// The preceding step.
        previous: usize,
        /// The offending step.
        step: usize,
    },

    /// Returned when a feature step exceeds the dataset's feature count.
    #[error("feature step {step} exceeds the {n_features} available features")]
    FeatureStepOutOfRange {
        /// The offending step.
        step: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when a label is not one of the two recognized classes.
    #[error("unrecognized label {value:?}, expected +1 or -1")]
    UnrecognizedLabel {
        /// The raw label text.
        value: String,
    },

    /// Returned when one of the two classes has no samples.
    #[error("dataset has no samples labeled {label}")]
    MissingClass {
        /// The absent class.
        label: Label,
    },

    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the number of labels differs from the number of samples.
    #[error("dataset has {samples} samples but {labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        samples: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// Zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based sample index.
        sample_index: usize,
        /// Zero-based feature index.
        feature_index: usize,
    },

    /// Returned when the number of feature names differs from the feature count.
    #[error("got {got} feature names for {expected} features")]
    FeatureNameCountMismatch {
        /// The number of features.
        expected: usize,
        /// The number of names provided.
        got: usize,
    },

    /// Returned when synthetic data parameters are unusable.
    #[error("invalid generator parameters: {reason}")]
    InvalidGeneratorParams {
        /// What is wrong with the parameters.
        reason: String,
    },

    /// Returned when a class has fewer samples than folds.
    #[error("class {label} has {count} samples, need at least {n_folds} for {n_folds} folds")]
    TooFewSamplesForFolds {
        /// The under-populated class.
        label: Label,
        /// The number of samples in that class.
        count: usize,
        /// The requested fold count.
        n_folds: usize,
    },

    /// Returned when a splitter's folds do not partition the samples.
    #[error("splitter produced an invalid partition: {reason}")]
    InvalidPartition {
        /// What is wrong with the folds.
        reason: String,
    },

    /// Returned when the classifier fails inside a cross-validation fold.
    #[error("classifier failed in repetition {repetition}, fold {fold}")]
    Classifier {
        /// Zero-based repetition.
        repetition: usize,
        /// Zero-based fold.
        fold: usize,
        /// The classifier's error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when the classifier fails while fitting the full dataset.
    #[error("classifier failed on the full dataset")]
    FinalFit {
        /// The classifier's error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when a model reports importances for the wrong number of features.
    #[error("model reported {got} importances for {expected} features")]
    ImportanceCountMismatch {
        /// The number of features the model was fitted on.
        expected: usize,
        /// The number of importances returned.
        got: usize,
    },

    /// Returned when predictions and truth labels differ in length.
    #[error("got {got} predictions for {expected} samples")]
    PredictionCountMismatch {
        /// The number of truth labels.
        expected: usize,
        /// The number of predictions.
        got: usize,
    },

    /// Returned when a score falls outside [-1, 1].
    #[error("score {value} at row {row}, column {column} is outside [-1, 1]")]
    ScoreOutOfRange {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        column: usize,
        /// The rejected score.
        value: f64,
    },

    /// Returned when a score cell is written twice.
    #[error("score cell at row {row}, column {column} already written")]
    CellAlreadyWritten {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        column: usize,
    },

    /// Returned when a score cell lies outside the matrix.
    #[error("score cell ({row}, {column}) is outside a {rows}x{columns} matrix")]
    CellOutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        columns: usize,
    },

    /// Returned when a score matrix width differs from the number of steps.
    #[error("score matrix has {columns} columns for {steps} feature steps")]
    StepCountMismatch {
        /// The number of feature steps.
        steps: usize,
        /// The number of matrix columns.
        columns: usize,
    },

    /// Returned when the matrix would hold more cells than fit in memory addressing.
    #[error("score matrix of {repetitions} x {n_folds} rows and {columns} columns is too large")]
    ScoreMatrixTooLarge {
        /// The number of repetitions.
        repetitions: usize,
        /// The number of folds per repetition.
        n_folds: usize,
        /// The number of columns.
        columns: usize,
    },

    /// Returned when a decoded score matrix violates its own shape or value range.
    #[error("malformed score matrix: {reason}")]
    MalformedScoreMatrix {
        /// What is inconsistent.
        reason: String,
    },

    /// Returned when a summary is requested before any row is complete.
    #[error("score matrix has no completed rows")]
    NoCompletedRows,

    /// Returned when bincode encoding of the score file fails.
    #[error("failed to serialize score matrix")]
    SerializeScores {
        /// The underlying bincode error.
        #[source]
        source: bincode::Error,
    },

    /// Returned when writing the score file fails.
    #[error("failed to write score file {}", path.display())]
    WriteScores {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Returned when reading the score file fails.
    #[error("failed to read score file {}", path.display())]
    ReadScores {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Returned when bincode decoding of the score file fails.
    #[error("failed to deserialize score file {}", path.display())]
    DeserializeScores {
        /// The file path.
        path: PathBuf,
        /// The underlying bincode error.
        #[source]
        source: bincode::Error,
    },

    /// Returned when the score file's format version is not supported.
    #[error("score file {} has format version {found}, expected {expected}", path.display())]
    IncompatibleVersion {
        /// The supported version.
        expected: u32,
        /// The version found in the file.
        found: u32,
        /// The file path.
        path: PathBuf,
    },

    /// Returned when a decoded score file has inconsistent dimensions.
    #[error("score file {} is corrupt: {reason}", path.display())]
    CorruptScores {
        /// The file path.
        path: PathBuf,
        /// What is inconsistent.
        reason: String,
    },
}

impl SelectError {
    /// Map this error onto the coarse error taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooFewSamplesForFolds { .. } => ErrorKind::InfeasiblePartition,
            Self::Classifier { .. }
            | Self::InvalidPartition { .. }
            | Self::FinalFit { .. }
            | Self::ImportanceCountMismatch { .. }
            | Self::PredictionCountMismatch { .. }
            | Self::ScoreOutOfRange { .. } => ErrorKind::CollaboratorFailure,
            Self::SerializeScores { .. }
            | Self::WriteScores { .. }
            | Self::ReadScores { .. }
            | Self::DeserializeScores { .. }
            | Self::IncompatibleVersion { .. }
            | Self::CorruptScores { .. }
            | Self::MalformedScoreMatrix { .. } => ErrorKind::Persistence,
            _ => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            SelectError::FeatureStepOutOfRange { step: 5, n_features: 3 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            SelectError::TooFewSamplesForFolds {
                label: Label::Positive,
                count: 1,
                n_folds: 2
            }
            .kind(),
            ErrorKind::InfeasiblePartition
        );
        let source: Box<dyn std::error::Error + Send + Sync> = "boom".into();
        assert_eq!(
            SelectError::Classifier { repetition: 0, fold: 1, source }.kind(),
            ErrorKind::CollaboratorFailure
        );
        assert_eq!(SelectError::NoCompletedRows.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            SelectError::MalformedScoreMatrix { reason: "x".into() }.kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn messages_carry_context() {
        let err = SelectError::StepsNotAscending {
            position: 2,
            previous: 10,
            step: 5,
        };
        assert_eq!(
            err.to_string(),
            "feature step 5 at position 2 does not exceed previous step 10"
        );
    }
}
