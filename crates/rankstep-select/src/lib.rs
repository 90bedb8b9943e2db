//! Feature-step selection by repeated stratified cross-validation.
//!
//! For each repetition the dataset is split into stratified folds. On every
//! fold a classifier ranks features by importance, then fresh classifiers are
//! trained on nested top-k subsets and scored on the held-out fold with the
//! Matthews correlation coefficient. The step with the best mean score wins.

mod classifier;
mod dataset;
mod error;
mod folds;
mod label;
mod metric;
mod persist;
mod result;
mod scores;
mod search;
mod selection;
mod steps;
mod synthetic;

pub use classifier::{Classifier, ForestError, TrainedModel};
pub use dataset::Dataset;
pub use error::{ErrorKind, SelectError};
pub use folds::{Fold, Splitter, StratifiedKFold};
pub use label::Label;
pub use metric::{BinaryConfusion, Mcc, Scorer};
pub use persist::ScoreFile;
pub use result::FeatureStepResult;
pub use scores::{ScoreMatrix, best_index};
pub use search::{FeatureStepSearch, Progress};
pub use selection::{RankedFeature, select_features};
pub use steps::FeatureSteps;
pub use synthetic::make_classification;
