//! Observation history: CSV ingestion, synthetic generation and the
//! cursor-bounded window shared between the simulation clock and the API.

pub mod history;
pub mod loader;
pub mod synthetic;

pub use history::{HistoryStore, HistoryWindow};
pub use loader::{assign_timestamps, load_csv, read_csv};
pub use synthetic::SyntheticGenerator;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("CSV error at record {record}: {source}")]
    Csv { record: usize, source: csv::Error },

    #[error("Missing column '{0}' in CSV header")]
    MissingColumn(String),
}
