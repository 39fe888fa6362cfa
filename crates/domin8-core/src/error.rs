//! Error types module
//!
//! All failures of the watermarking pipeline converge on the `AppError` enum. Each
//! variant self-describes how it is presented to callers through `ErrorMetadata`.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "COMPOSITION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the caller
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Composition error: {0}")]
    Composition(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Short variant name used in logs and non-production error bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "ValidationError",
            AppError::UnsupportedType(_) => "UnsupportedTypeError",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::ImageDecode(_) => "ImageDecodeError",
            AppError::Composition(_) => "CompositionError",
            AppError::Encryption(_) => "EncryptionError",
            AppError::Storage(_) => "StorageError",
            AppError::Delivery(_) => "DeliveryError",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Full message including the source chain, for server-side logs
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<crate::encryption::EncryptionError> for AppError {
    fn from(err: crate::encryption::EncryptionError) -> Self {
        AppError::Encryption(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check the file, logo and type fields and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedType(_) => (
            400,
            "UNSUPPORTED_TYPE",
            false,
            Some("Use one of: image, video, 3d"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::ImageDecode(_) => (
            500,
            "IMAGE_DECODE_ERROR",
            false,
            Some("Check image format and try a different file"),
            false,
            LogLevel::Error,
        ),
        AppError::Composition(_) => (
            500,
            "COMPOSITION_ERROR",
            false,
            Some("Check media format and try a different file"),
            true,
            LogLevel::Error,
        ),
        AppError::Encryption(_) => (
            500,
            "ENCRYPTION_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Delivery(_) => (
            500,
            "DELIVERY_ERROR",
            true,
            Some("Retry the download"),
            true,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the output name exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::UnsupportedType(tag) => format!("Unsupported file type: {}", tag),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::ImageDecode(_) => "Image could not be decoded".to_string(),
            AppError::Composition(_) => "Processing error".to_string(),
            AppError::Encryption(_) => "Processing error".to_string(),
            AppError::Storage(_) => "Storage error".to_string(),
            AppError::Delivery(_) => "File send failed".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}
