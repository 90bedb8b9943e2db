//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the most probable class; the lowest class index wins a tie.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0;
        for (class, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Return the probability assigned to `class` (0.0 for unseen classes).
    #[must_use]
    pub fn probability(&self, class: usize) -> f64 {
        self.probs.get(class).copied().unwrap_or(0.0)
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Average the leaf distributions of every tree for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }

        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (class, p) in tree.predict_proba(sample)?.iter().enumerate() {
                avg[class] += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);

        Ok(ClassDistribution::new(avg))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return probability distributions for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
