// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Engine outcomes (timeouts, non-zero exits, stderr output) are NOT errors at
/// this level: they are classified into a `ResponseEnvelope`. Only request
/// validation and server faults surface here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Input store error: {0}")]
    Store(#[from] crate::port::StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True when the caller sent a bad request (maps to HTTP 400)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Domain(crate::domain::DomainError::MissingRequiredFields)
        )
    }
}
