// Result Transcoder - visualization stdout -> structured trace

use crate::domain::ResponseEnvelope;
use thiserror::Error;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse visualization output";

/// Stdout that could not be parsed as JSON
#[derive(Error, Debug)]
#[error("{PARSE_FAILURE_MESSAGE}: {reason}")]
pub struct TranscodeFailure {
    pub raw_output: String,
    pub reason: String,
}

impl TranscodeFailure {
    /// Diagnostic passthrough shape: fixed message, raw text, captured stderr
    pub fn into_envelope(self, stderr: &str) -> ResponseEnvelope {
        ResponseEnvelope::VisualizationFailure {
            error: PARSE_FAILURE_MESSAGE.to_string(),
            raw_output: Some(self.raw_output),
            stderr: Some(stderr.to_string()),
        }
    }
}

/// Parse engine stdout as a JSON document
pub fn transcode(stdout: &str) -> Result<serde_json::Value, TranscodeFailure> {
    serde_json::from_str(stdout).map_err(|e| TranscodeFailure {
        raw_output: stdout.to_string(),
        reason: e.to_string(),
    })
}
