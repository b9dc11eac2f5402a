// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Missing required fields: json_data and query_string")]
    MissingRequiredFields,

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
