//! JSON summary writer and output file naming.

use std::fs;
use std::path::{Path, PathBuf};

use rankstep_select::{FeatureStepResult, RankedFeature};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Run parameters echoed into the summary artifact.
#[derive(Debug, Clone, Serialize)]
pub struct RunParameters {
    /// Input CSV path.
    pub data: String,
    /// Label column name.
    pub label_column: String,
    /// Number of CV repetitions.
    pub repetitions: usize,
    /// Number of folds per repetition.
    pub n_folds: usize,
    /// Base seed.
    pub seed: u64,
    /// Trees per forest.
    pub n_trees: usize,
    /// Maximum tree depth, if limited.
    pub max_depth: Option<usize>,
    /// Split criterion name.
    pub criterion: String,
    /// Whether folds ran concurrently.
    pub parallel: bool,
}

/// Writes evaluation artifacts into one directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_summary.json` and
/// `{experiment}_scores.bin`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the binary score matrix: `{experiment}_scores.bin`.
    #[must_use]
    pub fn scores_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_scores.bin", self.experiment.as_str()))
    }

    /// Path of the JSON summary: `{experiment}_summary.json`.
    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_summary.json", self.experiment.as_str()))
    }

    /// Write per-step statistics, the best step and the selected features to
    /// `{experiment}_summary.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_summary(
        &self,
        result: &FeatureStepResult,
        selected: &[RankedFeature],
        parameters: &RunParameters,
    ) -> Result<(), IoError> {
        let path = self.summary_path();

        let steps: Vec<StepEntry> = result
            .steps()
            .as_slice()
            .iter()
            .zip(result.means().iter().zip(result.stds()))
            .map(|(&features, (&mean_mcc, &std_mcc))| StepEntry {
                features,
                mean_mcc,
                std_mcc,
            })
            .collect();

        let scores = result.scores();
        let artifact = SummaryArtifact {
            experiment: self.experiment.as_str(),
            complete: scores.is_complete(),
            completed_rows: result.completed_rows(),
            total_rows: scores.n_rows(),
            parameters,
            steps,
            best_step: result.best_step(),
            best_mean_mcc: result.best_mean(),
            selected_features: selected,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::SerializeJson {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "summary written");
        Ok(())
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    experiment: &'a str,
    complete: bool,
    completed_rows: usize,
    total_rows: usize,
    parameters: &'a RunParameters,
    steps: Vec<StepEntry>,
    best_step: usize,
    best_mean_mcc: f64,
    selected_features: &'a [RankedFeature],
}

#[derive(Serialize)]
struct StepEntry {
    features: usize,
    mean_mcc: f64,
    std_mcc: f64,
}
