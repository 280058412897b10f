//! Error handling module for the TicShare client core.
//!
//! Provides centralized error types for every operation boundary. All errors
//! are recoverable: they are caught at the edge of the triggering operation
//! and surfaced as a single notification, never a process failure.

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const RESET_FAILED: &str = "RESET_FAILED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SIZE_LIMIT_EXCEEDED: &str = "SIZE_LIMIT_EXCEEDED";
    pub const PERSIST_FAILURE: &str = "PERSIST_FAILURE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Wrong secret for the selected account
    AuthFailed(String),
    /// Wrong override key or mismatched new-secret confirmation
    ResetFailed(String),
    /// Validation error (name too long, secret too short, foreign author...)
    Validation(String),
    /// Upload or file exceeds the configured size ceiling
    SizeLimitExceeded { message: String, size_bytes: u64 },
    /// Remote write rejected or unreachable
    Persist(String),
    /// A referenced record does not exist locally
    NotFound(String),
}

impl AppError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::AuthFailed(_) => codes::AUTH_FAILED,
            AppError::ResetFailed(_) => codes::RESET_FAILED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::SizeLimitExceeded { .. } => codes::SIZE_LIMIT_EXCEEDED,
            AppError::Persist(_) => codes::PERSIST_FAILURE,
            AppError::NotFound(_) => codes::NOT_FOUND,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::AuthFailed(msg) => msg.clone(),
            AppError::ResetFailed(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::SizeLimitExceeded { message, .. } => message.clone(),
            AppError::Persist(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Remote store error: {:?}", err);
        AppError::Persist(format!("Remote store error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Persist(format!("JSON error: {}", err))
    }
}
