/// Errors from Random Forest training and prediction.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the number of labels differs from the number of samples.
    #[error("got {labels} labels for {samples} samples")]
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
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },
}
