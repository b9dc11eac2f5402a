// Response Envelope - the single response produced per request

use serde::Serialize;

/// Response shapes returned to the client
///
/// Serialized untagged so each variant produces the flat JSON body clients
/// expect: `{"result": ..}`, `{"error": ..}`, the raw trace, or the
/// visualization diagnostic shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        result: String,
    },
    Failure {
        error: String,
    },
    VisualizationSuccess(serde_json::Value),
    VisualizationFailure {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_output: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
    },
}

impl ResponseEnvelope {
    pub fn success(result: impl Into<String>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn visualization_failure(error: impl Into<String>) -> Self {
        Self::VisualizationFailure {
            error: error.into(),
            raw_output: None,
            stderr: None,
        }
    }

    /// Error message carried by the envelope, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error } | Self::VisualizationFailure { error, .. } => Some(error),
            Self::Success { .. } | Self::VisualizationSuccess(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::VisualizationSuccess(_))
    }
}
