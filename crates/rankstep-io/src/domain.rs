//! Domain types for rankstep-io.

use rankstep_select::Dataset;

use crate::IoError;

/// A sample identifier from the first column of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    /// Wrap a sample id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the sample id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated dataset together with the sample ids it was read with.
///
/// `sample_ids()[i]` names `dataset().features()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    sample_ids: Vec<SampleId>,
    dataset: Dataset,
}

impl LabeledTable {
    pub(crate) fn new(sample_ids: Vec<SampleId>, dataset: Dataset) -> Self {
        debug_assert_eq!(sample_ids.len(), dataset.n_samples());
        Self {
            sample_ids,
            dataset,
        }
    }

    /// Wrap a dataset, naming samples `s0`, `s1`, ...
    #[must_use]
    pub fn with_generated_ids(dataset: Dataset) -> Self {
        let sample_ids = (0..dataset.n_samples())
            .map(|i| SampleId::new(format!("s{i}")))
            .collect();
        Self::new(sample_ids, dataset)
    }

    /// Return the sample ids.
    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    /// Borrow the dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume the table, returning the dataset.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
