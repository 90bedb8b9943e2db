//! Training-set validation and the column-major view used by split search.

use crate::error::RfError;

/// A validated training set, transposed to column-major layout.
///
/// `columns[feature][sample]` holds every value of one feature, so split
/// search can scan a single contiguous vector per candidate feature.
#[derive(Debug)]
pub(crate) struct ColumnData<'a> {
    pub(crate) columns: Vec<Vec<f64>>,
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
}

impl<'a> ColumnData<'a> {
    /// Validate a row-major dataset and transpose it.
    ///
    /// `features[sample_idx][feature_idx]` with class labels in `labels`.
    pub(crate) fn from_rows(features: &[Vec<f64>], labels: &'a [usize]) -> Result<Self, RfError> {
        if features.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if labels.len() != features.len() {
            return Err(RfError::LabelCountMismatch {
                samples: features.len(),
                labels: labels.len(),
            });
        }
        let n_features = features[0].len();
        if n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }
        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(RfError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
                return Err(RfError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }

        let columns = (0..n_features)
            .map(|f| features.iter().map(|row| row[f]).collect())
            .collect();
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

        Ok(Self {
            columns,
            labels,
            n_classes,
        })
    }

    pub(crate) fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub(crate) fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Count labels of the given samples; indices may repeat (bootstrap draws).
    pub(crate) fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.labels[s]] += 1;
        }
        counts
    }
}
