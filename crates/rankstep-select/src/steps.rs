//! Ascending feature-step sequences.

use std::fmt;

use crate::error::SelectError;

/// A non-empty, strictly ascending sequence of positive subset sizes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct FeatureSteps(Vec<usize>);

impl FeatureSteps {
    /// Validate a step sequence.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::EmptyFeatureSteps`] | `steps` is empty |
    /// | [`SelectError::ZeroFeatureStep`] | a step is zero |
    /// | [`SelectError::StepsNotAscending`] | a step does not exceed its predecessor |
    pub fn new(steps: Vec<usize>) -> Result<Self, SelectError> {
        if steps.is_empty() {
            return Err(SelectError::EmptyFeatureSteps);
        }
        if let Some(position) = steps.iter().position(|&s| s == 0) {
            return Err(SelectError::ZeroFeatureStep { position });
        }
        for (position, pair) in steps.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SelectError::StepsNotAscending {
                    position: position + 1,
                    previous: pair[0],
                    step: pair[1],
                });
            }
        }
        Ok(Self(steps))
    }

    /// Check that every step fits a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::FeatureStepOutOfRange`] naming the largest step
    /// when it exceeds `n_features`.
    pub fn check_fits(&self, n_features: usize) -> Result<(), SelectError> {
        let largest = self.largest();
        if largest > n_features {
            return Err(SelectError::FeatureStepOutOfRange {
                step: largest,
                n_features,
            });
        }
        Ok(())
    }

    /// Return the steps as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Return the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the last (largest) step.
    #[must_use]
    pub fn largest(&self) -> usize {
        self.0[self.0.len() - 1]
    }
}

impl TryFrom<Vec<usize>> for FeatureSteps {
    type Error = SelectError;

    fn try_from(steps: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<FeatureSteps> for Vec<usize> {
    fn from(steps: FeatureSteps) -> Self {
        steps.0
    }
}

impl fmt::Display for FeatureSteps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}
