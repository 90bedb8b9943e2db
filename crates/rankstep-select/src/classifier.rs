//! Classifier seam and its Random Forest implementation.

use rankstep_rf::{RandomForest, RandomForestConfig, RfError};

use crate::label::Label;

/// A trainable classifier that exposes per-feature importances.
///
/// `fit` must not keep state between calls: every call returns a fresh model.
pub trait Classifier: Sync {
    /// The fitted model type.
    type Model: TrainedModel;
    /// The error returned by fitting or predicting.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Train a model on row-major `features` with aligned `labels`.
    ///
    /// # Errors
    ///
    /// Returns the classifier's own error when training fails.
    fn fit(&self, features: &[Vec<f64>], labels: &[Label], seed: u64) -> Result<Self::Model, Self::Error>;
}

/// A fitted model.
pub trait TrainedModel {
    /// The error returned by prediction.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Predict one label per row of `features`.
    ///
    /// # Errors
    ///
    /// Returns the model's own error when prediction fails.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, Self::Error>;

    /// One importance score per training feature, aligned by column index.
    fn feature_importances(&self) -> Vec<f64>;
}

/// Errors from a fitted forest used as a binary [`TrainedModel`].
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// The forest itself failed.
    #[error(transparent)]
    Forest(#[from] RfError),

    /// The forest predicted a class index that maps to no label.
    #[error("forest predicted class index {class}, expected 0 or 1")]
    UnexpectedClass {
        /// The predicted class index.
        class: usize,
    },
}

/// The seed argument replaces the configured seed.
impl Classifier for RandomForestConfig {
    type Model = RandomForest;
    type Error = RfError;

    fn fit(&self, features: &[Vec<f64>], labels: &[Label], seed: u64) -> Result<RandomForest, RfError> {
        let classes: Vec<usize> = labels.iter().map(|l| l.class_index()).collect();
        self.clone().with_seed(seed).fit(features, &classes)
    }
}

impl TrainedModel for RandomForest {
    type Error = ForestError;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ForestError> {
        self.predict_batch(features)?
            .into_iter()
            .map(|class| Label::from_class_index(class).ok_or(ForestError::UnexpectedClass { class }))
            .collect()
    }

    fn feature_importances(&self) -> Vec<f64> {
        RandomForest::feature_importances(self)
    }
}
