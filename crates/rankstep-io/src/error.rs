//! I/O error types for rankstep-io.

use std::path::PathBuf;

use rankstep_select::SelectError;

/// Errors from CSV parsing, dataset validation and result writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the header has no column with the label name.
    #[error("label column \"{column}\" not found in {path}")]
    MissingLabelColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The label column name that was looked for.
        column: String,
    },

    /// Returned when the header has no columns besides the sample id and label.
    #[error("no feature columns in {path}")]
    NoFeatureColumns {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} (sample {sample_id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Sample id of the offending row.
        sample_id: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Name of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a label cell is not `+1` or `-1`.
    #[error("invalid label in {path}: row {row_index} (sample {sample_id}), column \"{column}\", raw value \"{raw}\"")]
    InvalidLabel {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Sample id of the offending row.
        sample_id: String,
        /// Name of the label column.
        column: String,
        /// The raw label text.
        raw: String,
    },

    /// Returned when the same sample id appears more than once.
    #[error("duplicate sample id \"{sample_id}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateSampleId {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated sample id.
        sample_id: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when the parsed table is not a usable dataset (e.g. one class only).
    #[error("invalid dataset in {path}")]
    InvalidDataset {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying validation error.
        source: SelectError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV file cannot be written.
    #[error("cannot write CSV file {path}")]
    CsvWrite {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a JSON artifact cannot be encoded.
    #[error("cannot encode JSON for {path}")]
    SerializeJson {
        /// Path the artifact was destined for.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}
