use gnn_core::GnnError;
use thiserror::Error;

/// Errors raised while loading datasets and assembling batches.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Format(String),

    #[error("Sample index {index} out of bounds for a dataset of {len} samples")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    Core(#[from] GnnError),
}
