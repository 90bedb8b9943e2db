//! Score matrix serialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::SelectError;
use crate::scores::ScoreMatrix;
use crate::steps::FeatureSteps;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for a serialized score matrix.
#[derive(serde::Serialize, serde::Deserialize)]
struct ScoreEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// `false` for checkpoints written mid-run.
    complete: bool,
    /// Number of repetitions.
    repetitions: usize,
    /// Number of folds per repetition.
    n_folds: usize,
    /// Feature steps, one per matrix column.
    steps: FeatureSteps,
    /// The matrix itself.
    matrix: ScoreMatrix,
}

/// A score matrix as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreFile {
    /// Whether the run that wrote the file finished.
    pub complete: bool,
    /// Feature steps, one per matrix column.
    pub steps: FeatureSteps,
    /// The (possibly partial) score matrix.
    pub scores: ScoreMatrix,
}

impl ScoreFile {
    /// Wrap a matrix for saving.
    #[must_use]
    pub fn new(steps: FeatureSteps, scores: ScoreMatrix, complete: bool) -> Self {
        Self {
            complete,
            steps,
            scores,
        }
    }

    /// Save to a binary file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::SerializeScores`] | bincode encoding failed |
    /// | [`SelectError::WriteScores`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display(), complete = self.complete))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SelectError> {
        let path = path.as_ref();

        let envelope = ScoreEnvelope {
            format_version: FORMAT_VERSION,
            complete: self.complete,
            repetitions: self.scores.repetitions(),
            n_folds: self.scores.n_folds(),
            steps: self.steps.clone(),
            matrix: self.scores.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| SelectError::SerializeScores { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| SelectError::WriteScores {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(
            size_bytes = bytes.len(),
            completed_rows = self.scores.completed_rows(),
            "score matrix saved"
        );

        Ok(())
    }

    /// Load from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::ReadScores`] | file read failed |
    /// | [`SelectError::DeserializeScores`] | bincode decoding failed, including a matrix whose cells do not fit its shape or range |
    /// | [`SelectError::IncompatibleVersion`] | format version mismatch |
    /// | [`SelectError::CorruptScores`] | the header disagrees with the matrix |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SelectError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| SelectError::ReadScores {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ScoreEnvelope =
            bincode::deserialize(&bytes).map_err(|e| SelectError::DeserializeScores {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(SelectError::IncompatibleVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let matrix = envelope.matrix;
        let corrupt = |reason: &str| SelectError::CorruptScores {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        if matrix.repetitions() != envelope.repetitions || matrix.n_folds() != envelope.n_folds {
            return Err(corrupt("header disagrees with matrix shape"));
        }
        if matrix.n_columns() != envelope.steps.len() {
            return Err(corrupt("column count differs from step count"));
        }

        info!(
            complete = envelope.complete,
            completed_rows = matrix.completed_rows(),
            n_rows = matrix.n_rows(),
            "score matrix loaded"
        );

        Ok(Self {
            complete: envelope.complete,
            steps: envelope.steps,
            scores: matrix,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn partial_file() -> ScoreFile {
        let steps = FeatureSteps::new(vec![1, 4]).unwrap();
        let mut scores = ScoreMatrix::new(2, 2, 2).unwrap();
        scores.set_row(0, &[0.25, 0.5]).unwrap();
        scores.set_row(1, &[-0.5, 1.0]).unwrap();
        ScoreFile::new(steps, scores, false)
    }

    #[test]
    fn round_trip_preserves_partial_matrix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.bin");

        let original = partial_file();
        original.save(&path).unwrap();
        let loaded = ScoreFile::load(&path).unwrap();

        assert_eq!(loaded, original);
        assert!(!loaded.complete);
        assert_eq!(loaded.scores.completed_rows(), 2);
        assert_eq!(loaded.scores.get(2, 0), None);
    }

    #[test]
    fn version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.bin");
        let file = partial_file();
        let envelope = ScoreEnvelope {
            format_version: FORMAT_VERSION + 1,
            complete: true,
            repetitions: 2,
            n_folds: 2,
            steps: file.steps,
            matrix: file.scores,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = ScoreFile::load(&path).unwrap_err();
        assert!(matches!(
            err,
            SelectError::IncompatibleVersion { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn inconsistent_header_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.bin");
        let file = partial_file();
        let envelope = ScoreEnvelope {
            format_version: FORMAT_VERSION,
            complete: true,
            repetitions: 3,
            n_folds: 2,
            steps: file.steps,
            matrix: file.scores,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        assert!(matches!(
            ScoreFile::load(&path),
            Err(SelectError::CorruptScores { .. })
        ));
    }

    #[test]
    fn missing_file_and_garbage() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ScoreFile::load(dir.path().join("absent.bin")),
            Err(SelectError::ReadScores { .. })
        ));
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"xy").unwrap();
        assert!(matches!(
            ScoreFile::load(&path),
            Err(SelectError::DeserializeScores { .. })
        ));
    }

    #[test]
    fn out_of_range_cell_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tampered.bin");
        partial_file().save(&path).unwrap();

        // Overwrite the first written cell (0.25) with a value outside [-1, 1].
        let mut bytes = std::fs::read(&path).unwrap();
        let needle = 0.25f64.to_le_bytes();
        let at = bytes.windows(8).position(|w| w == needle).unwrap();
        bytes[at..at + 8].copy_from_slice(&7.5f64.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = ScoreFile::load(&path).unwrap_err();
        assert!(matches!(err, SelectError::DeserializeScores { .. }));
        assert!(std::error::Error::source(&err).unwrap().to_string().contains("outside [-1, 1]"));
    }
}
