use thiserror::Error;

/// Fatal processing failures. Everything else about an archive is reported
/// as a diagnostic or validation problem instead.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Invalid OSZ file: not a readable zip archive ({0})")]
    InvalidArchive(#[source] zip::result::ZipError),
    #[error("No valid beatmap files found in OSZ")]
    NoValidCharts,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
