use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the operator. None of them leave session state
/// partially mutated: validation happens before anything changes.
#[derive(Debug, Error)]
pub enum OpenFieldError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("start a test first to generate the report")]
    NotStarted,

    #[error("no report has been generated to export")]
    NoReport,

    #[error("could not export report to {}: {source}", .path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OpenFieldError>;
