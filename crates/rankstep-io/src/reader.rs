//! CSV dataset reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rankstep_select::{Dataset, Label};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{LabeledTable, SampleId};

/// Default name of the label column.
pub const DEFAULT_LABEL_COLUMN: &str = "label";

/// Reads a labeled binary dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required; the first column is the sample id
/// - One column (named `label` unless configured) holds `+1` / `-1`
/// - Every other column is a numeric feature, named by its header
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | No header column matches the label name |
/// | [`IoError::NoFeatureColumns`] | Only the id and label columns exist |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::DuplicateSampleId`] | Same sample id appears twice |
/// | [`IoError::InvalidLabel`] | Label cell is not `+1` or `-1` |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::InvalidDataset`] | Only one class is present |
pub struct DatasetReader {
    path: PathBuf,
    label_column: String,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }

    /// Use a different label column name.
    #[must_use]
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    /// Read and validate the CSV file, returning a [`LabeledTable`].
    #[instrument(skip(self), fields(path = %self.path.display(), label_column = %self.label_column))]
    pub fn read(&self) -> Result<LabeledTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows reach our own InconsistentRowLength check.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let label_index = header
            .iter()
            .skip(1)
            .position(|name| name == self.label_column)
            .map(|p| p + 1)
            .ok_or_else(|| IoError::MissingLabelColumn {
                path: self.path.clone(),
                column: self.label_column.clone(),
            })?;

        let feature_columns: Vec<usize> = (1..expected_cols).filter(|&c| c != label_index).collect();
        if feature_columns.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let feature_names: Vec<String> = feature_columns
            .iter()
            .map(|&c| header[c].to_string())
            .collect();

        let mut sample_ids = Vec::new();
        let mut labels = Vec::new();
        let mut features = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let sample_id = record.get(0).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    sample_id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            if let Some(&first_row) = seen.get(&sample_id) {
                return Err(IoError::DuplicateSampleId {
                    path: self.path.clone(),
                    sample_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(sample_id.clone(), row_index);

            let raw_label = &record[label_index];
            let label: Label = raw_label.parse().map_err(|_| IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                sample_id: sample_id.clone(),
                column: self.label_column.clone(),
                raw: raw_label.to_string(),
            })?;

            let mut row = Vec::with_capacity(feature_columns.len());
            for &c in &feature_columns {
                let raw = &record[c];
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: header[c].to_string(),
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }

            sample_ids.push(SampleId::new(sample_id));
            labels.push(label);
            features.push(row);
        }

        if sample_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let invalid = |source| IoError::InvalidDataset {
            path: self.path.clone(),
            source,
        };
        let dataset = Dataset::new(features, labels)
            .and_then(|d| d.with_feature_names(feature_names))
            .map_err(invalid)?;

        info!(
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            n_positive = dataset.class_count(Label::Positive),
            n_negative = dataset.class_count(Label::Negative),
            "labeled dataset loaded"
        );

        Ok(LabeledTable::new(sample_ids, dataset))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
