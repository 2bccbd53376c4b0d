use thiserror::Error;

/// Main error type for the log subsystem
#[derive(Debug, Error)]
pub enum LogError {
    // Validation errors
    #[error("Invalid date format: {0}. Expected YYYY-MM-DD, e.g. 2025-05-05")]
    InvalidDate(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Log-related errors
    #[error("Log error: {0}")]
    LogError(String),

    #[error("Failed to access log file: {0}")]
    LogFileError(String),

    #[error("No available log file path for {0} after {1} attempts")]
    RotationExhausted(String, usize),

    // Upload errors
    #[error("No log content to upload")]
    NothingToUpload,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload timed out ({0}ms)")]
    UploadTimeout(u128),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for log operations
pub type Result<T> = std::result::Result<T, LogError>;
