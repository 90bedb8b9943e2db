//! Write-once score matrix.

use crate::error::SelectError;

/// Scores indexed by (repetition, fold) row and feature-step column.
///
/// Row `r * n_folds + k` holds repetition `r`, fold `k`. Each cell can be
/// written once, with a value in [-1, 1]. Summaries only use rows whose
/// cells are all written, so a partially filled matrix can still be
/// inspected.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawScoreMatrix")]
pub struct ScoreMatrix {
    repetitions: usize,
    n_folds: usize,
    n_columns: usize,
    cells: Vec<Option<f64>>,
}

/// Unvalidated wire form of [`ScoreMatrix`].
#[derive(serde::Deserialize)]
struct RawScoreMatrix {
    repetitions: usize,
    n_folds: usize,
    n_columns: usize,
    cells: Vec<Option<f64>>,
}

impl TryFrom<RawScoreMatrix> for ScoreMatrix {
    type Error = SelectError;

    fn try_from(raw: RawScoreMatrix) -> Result<Self, SelectError> {
        let malformed = |reason: String| SelectError::MalformedScoreMatrix { reason };
        let expected = cell_count(raw.repetitions, raw.n_folds, raw.n_columns)
            .ok_or_else(|| malformed("dimensions overflow".into()))?;
        if raw.cells.len() != expected {
            return Err(malformed(format!(
                "{} cells for a {} x {} x {} matrix",
                raw.cells.len(),
                raw.repetitions,
                raw.n_folds,
                raw.n_columns
            )));
        }
        if let Some(value) = raw.cells.iter().flatten().find(|v| !(-1.0..=1.0).contains(*v)) {
            return Err(malformed(format!("score {value} is outside [-1, 1]")));
        }
        Ok(Self {
            repetitions: raw.repetitions,
            n_folds: raw.n_folds,
            n_columns: raw.n_columns,
            cells: raw.cells,
        })
    }
}

fn cell_count(repetitions: usize, n_folds: usize, n_columns: usize) -> Option<usize> {
    repetitions.checked_mul(n_folds)?.checked_mul(n_columns)
}

impl ScoreMatrix {
    /// Allocate an empty matrix with `repetitions * n_folds` rows.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::ScoreMatrixTooLarge`] when the cell count overflows `usize`.
    pub fn new(repetitions: usize, n_folds: usize, n_columns: usize) -> Result<Self, SelectError> {
        let n_cells = cell_count(repetitions, n_folds, n_columns).ok_or(
            SelectError::ScoreMatrixTooLarge {
                repetitions,
                n_folds,
                columns: n_columns,
            },
        )?;
        Ok(Self {
            repetitions,
            n_folds,
            n_columns,
            cells: vec![None; n_cells],
        })
    }

    /// Return the number of repetitions.
    #[must_use]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Return the number of folds per repetition.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the number of rows (`repetitions * n_folds`).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.repetitions * self.n_folds
    }

    /// Return the number of columns (feature steps).
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Return the row holding `repetition`, `fold`.
    #[must_use]
    pub fn row_index(&self, repetition: usize, fold: usize) -> usize {
        repetition * self.n_folds + fold
    }

    fn offset(&self, row: usize, column: usize) -> Result<usize, SelectError> {
        if row >= self.n_rows() || column >= self.n_columns {
            return Err(SelectError::CellOutOfBounds {
                row,
                column,
                rows: self.n_rows(),
                columns: self.n_columns,
            });
        }
        Ok(row * self.n_columns + column)
    }

    /// Write one cell.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::CellOutOfBounds`] | `row` or `column` is outside the matrix |
    /// | [`SelectError::ScoreOutOfRange`] | `value` is not in [-1, 1] |
    /// | [`SelectError::CellAlreadyWritten`] | the cell already holds a value |
    pub fn set(&mut self, row: usize, column: usize, value: f64) -> Result<(), SelectError> {
        let offset = self.offset(row, column)?;
        if !(-1.0..=1.0).contains(&value) {
            return Err(SelectError::ScoreOutOfRange { row, column, value });
        }
        let cell = &mut self.cells[offset];
        if cell.is_some() {
            return Err(SelectError::CellAlreadyWritten { row, column });
        }
        *cell = Some(value);
        Ok(())
    }

    /// Write a whole row, column by column.
    ///
    /// # Errors
    ///
    /// Same as [`ScoreMatrix::set`]; also [`SelectError::CellOutOfBounds`]
    /// when `values` is longer than a row. Cells before the failing one stay
    /// written.
    pub fn set_row(&mut self, row: usize, values: &[f64]) -> Result<(), SelectError> {
        for (column, &value) in values.iter().enumerate() {
            self.set(row, column, value)?;
        }
        Ok(())
    }

    /// Read one cell, `None` when unwritten or out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.offset(row, column).ok().and_then(|o| self.cells[o])
    }

    /// Return the values of a fully written row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.n_rows() {
            return None;
        }
        let start = row * self.n_columns;
        self.cells[start..start + self.n_columns].iter().copied().collect()
    }

    /// Return `true` when every cell of `row` is written.
    #[must_use]
    pub fn is_row_complete(&self, row: usize) -> bool {
        self.row(row).is_some()
    }

    /// Count the fully written rows.
    #[must_use]
    pub fn completed_rows(&self) -> usize {
        (0..self.n_rows()).filter(|&r| self.is_row_complete(r)).count()
    }

    /// Return `true` when every cell is written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn complete_rows(&self) -> Result<Vec<Vec<f64>>, SelectError> {
        let rows: Vec<Vec<f64>> = (0..self.n_rows()).filter_map(|r| self.row(r)).collect();
        if rows.is_empty() {
            return Err(SelectError::NoCompletedRows);
        }
        Ok(rows)
    }

    /// Arithmetic mean of each column over the completed rows.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::NoCompletedRows`] when no row is complete.
    pub fn column_means(&self) -> Result<Vec<f64>, SelectError> {
        let rows = self.complete_rows()?;
        let n = rows.len() as f64;
        Ok((0..self.n_columns)
            .map(|c| rows.iter().map(|row| row[c]).sum::<f64>() / n)
            .collect())
    }

    /// Population standard deviation of each column over the completed rows.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::NoCompletedRows`] when no row is complete.
    pub fn column_stds(&self) -> Result<Vec<f64>, SelectError> {
        let means = self.column_means()?;
        let rows = self.complete_rows()?;
        let n = rows.len() as f64;
        Ok(means
            .iter()
            .enumerate()
            .map(|(c, &mean)| {
                let variance = rows.iter().map(|row| (row[c] - mean).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect())
    }
}

/// Index of the largest value; the first one wins ties.
#[must_use]
pub fn best_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none_or(|b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}
