pub mod csv_export;
pub mod csv_import;
pub mod file;
pub mod settings;

pub use csv_export::export_csv;
pub use csv_import::import_csv;
pub use file::{default_data_path, load_snapshot, save_snapshot, FileError, Snapshot};
pub use settings::AppSettings;

use thiserror::Error;

/// Errors from CSV import and export.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Invalid(String),
}
