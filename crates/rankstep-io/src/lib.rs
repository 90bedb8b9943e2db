//! File I/O, validation, and serialization for the rankstep pipeline.

mod dataset_writer;
mod domain;
mod error;
mod reader;
mod writer;

pub use dataset_writer::write_dataset;
pub use domain::{ExperimentName, LabeledTable, SampleId};
pub use error::IoError;
pub use reader::{DEFAULT_LABEL_COLUMN, DatasetReader};
pub use writer::{ResultWriter, RunParameters};
