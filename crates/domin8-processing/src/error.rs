use domin8_core::AppError;
use std::time::Duration;

/// Errors raised while producing a watermarked asset
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode output: {0}")]
    Encode(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Transcode exceeded {0:?}")]
    Timeout(Duration),

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Decode(msg) => AppError::ImageDecode(msg),
            other => AppError::Composition(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProcessingError::Task(err.to_string())
    }
}
