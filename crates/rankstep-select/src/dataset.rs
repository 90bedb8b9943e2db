//! Validated labeled dataset.

use crate::error::SelectError;
use crate::label::Label;

/// A labeled numeric dataset with both classes present.
///
/// Rows are samples, columns are features. Every value is finite and every
/// row has the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Validate and wrap a feature matrix and its labels.
    ///
    /// Feature names default to `f0`, `f1`, ...
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::EmptyDataset`] | `features` is empty |
    /// | [`SelectError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`SelectError::ZeroFeatures`] | rows have no columns |
    /// | [`SelectError::FeatureCountMismatch`] | rows have different widths |
    /// | [`SelectError::NonFiniteValue`] | a value is NaN or infinite |
    /// | [`SelectError::MissingClass`] | one class has no samples |
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> Result<Self, SelectError> {
        if features.is_empty() {
            return Err(SelectError::EmptyDataset);
        }
        if labels.len() != features.len() {
            return Err(SelectError::LabelCountMismatch {
                samples: features.len(),
                labels: labels.len(),
            });
        }
        let n_features = features[0].len();
        if n_features == 0 {
            return Err(SelectError::ZeroFeatures);
        }
        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(SelectError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
                return Err(SelectError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
        for label in Label::ALL {
            if !labels.contains(&label) {
                return Err(SelectError::MissingClass { label });
            }
        }

        let feature_names = (0..n_features).map(|i| format!("f{i}")).collect();
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    /// Replace the default feature names.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::FeatureNameCountMismatch`] when `names.len()`
    /// differs from the feature count.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, SelectError> {
        if names.len() != self.n_features() {
            return Err(SelectError::FeatureNameCountMismatch {
                expected: self.n_features(),
                got: names.len(),
            });
        }
        self.feature_names = names;
        Ok(self)
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Return the number of features per sample.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features[0].len()
    }

    /// Borrow the feature rows.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Borrow the labels, aligned with [`Dataset::features`].
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Borrow the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Count the samples carrying `label`.
    #[must_use]
    pub fn class_count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Copy out the rows at `indices`, in the given order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<Label>) {
        let features = indices.iter().map(|&i| self.features[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        (features, labels)
    }
}

/// Keep only `columns` of each row, in the order given.
pub(crate) fn project(rows: &[Vec<f64>], columns: &[usize]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| columns.iter().map(|&c| row[c]).collect())
        .collect()
}
