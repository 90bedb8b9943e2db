//! CSV dataset writer, the inverse of [`DatasetReader`](crate::DatasetReader).

use std::path::Path;

use tracing::{info, instrument};

use crate::IoError;
use crate::domain::LabeledTable;

/// Write `table` as CSV: sample id, then `label_column`, then one column per feature.
///
/// Values are written in shortest round-trip form, so reading the file back
/// reproduces the dataset exactly.
///
/// # Errors
///
/// Returns [`IoError::CsvWrite`] if the file cannot be created or written.
#[instrument(skip(path, table), fields(path = %path.display()))]
pub fn write_dataset(path: &Path, table: &LabeledTable, label_column: &str) -> Result<(), IoError> {
    let csv_error = |e| IoError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;

    let dataset = table.dataset();
    let mut header = vec!["sample_id".to_string(), label_column.to_string()];
    header.extend(dataset.feature_names().iter().cloned());
    wtr.write_record(&header).map_err(csv_error)?;

    for ((id, label), row) in table
        .sample_ids()
        .iter()
        .zip(dataset.labels())
        .zip(dataset.features())
    {
        let mut record = Vec::with_capacity(row.len() + 2);
        record.push(id.to_string());
        record.push(label.to_string());
        record.extend(row.iter().map(f64::to_string));
        wtr.write_record(&record).map_err(csv_error)?;
    }

    wtr.flush().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(
        n_samples = dataset.n_samples(),
        n_features = dataset.n_features(),
        "dataset written"
    );
    Ok(())
}
