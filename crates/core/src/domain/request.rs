// Query Request Domain Model

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Request body as received from the wire.
///
/// Both fields are optional here so a missing field becomes a validation
/// failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQueryRequest {
    #[serde(default)]
    pub json_data: Option<String>,
    #[serde(default)]
    pub query_string: Option<String>,
}

impl RawQueryRequest {
    pub fn new(json_data: impl Into<String>, query_string: impl Into<String>) -> Self {
        Self {
            json_data: Some(json_data.into()),
            query_string: Some(query_string.into()),
        }
    }

    /// Validate into a `QueryRequest`
    ///
    /// Empty strings count as missing.
    pub fn validate(self) -> Result<QueryRequest> {
        match (self.json_data, self.query_string) {
            (Some(json_data), Some(query_string))
                if !json_data.is_empty() && !query_string.is_empty() =>
            {
                Ok(QueryRequest {
                    json_data,
                    query_string,
                })
            }
            _ => Err(DomainError::MissingRequiredFields),
        }
    }
}

/// Validated query request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Raw input document, written verbatim for the engine
    pub json_data: String,
    /// Query expression, passed as a single argv entry
    pub query_string: String,
}
