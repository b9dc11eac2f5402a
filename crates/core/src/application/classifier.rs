// Outcome Classifier - raw process outcome -> ResponseEnvelope

use crate::application::transcoder::transcode;
use crate::domain::{InvocationLimits, ProcessInvocationResult, ResponseEnvelope};

/// Prefix for failures that carry no engine diagnostics
pub const EXECUTION_ERROR_PREFIX: &str = "Execution error: ";

/// Classify a query-engine run (first match wins)
///
/// 1. killed by timeout -> fixed timeout message
/// 2. exit error + stderr -> trimmed stderr
/// 3. exit error, no stderr -> "Execution error: <reason>"
/// 4. clean exit + stderr -> trimmed stderr (engine warnings are user-facing)
/// 5. otherwise -> trimmed stdout
pub fn classify_query(
    result: &ProcessInvocationResult,
    limits: &InvocationLimits,
) -> ResponseEnvelope {
    if result.killed_by_timeout {
        return ResponseEnvelope::failure(format!(
            "Query execution timeout (exceeded {})",
            limits.timeout_label()
        ));
    }

    let stderr = result.stderr.trim();

    match &result.exit_error {
        Some(_) if !stderr.is_empty() => ResponseEnvelope::failure(stderr),
        Some(exit_error) => {
            ResponseEnvelope::failure(format!("{}{}", EXECUTION_ERROR_PREFIX, exit_error))
        }
        None if !stderr.is_empty() => ResponseEnvelope::failure(stderr),
        None => ResponseEnvelope::success(result.stdout.trim()),
    }
}

/// Classify a visualization-engine run
///
/// Timeout and exit errors are handled as on the query path; a clean exit
/// hands stdout to the transcoder. Stderr on a clean exit is not an error
/// here, it only travels inside the parse-failure diagnostic.
pub fn classify_visualization(
    result: &ProcessInvocationResult,
    limits: &InvocationLimits,
) -> ResponseEnvelope {
    if result.killed_by_timeout {
        return ResponseEnvelope::visualization_failure(format!(
            "Visualization timeout (exceeded {})",
            limits.timeout_label()
        ));
    }

    if let Some(exit_error) = &result.exit_error {
        return ResponseEnvelope::VisualizationFailure {
            error: format!("{}{}", EXECUTION_ERROR_PREFIX, exit_error),
            raw_output: None,
            stderr: Some(result.stderr.clone()),
        };
    }

    match transcode(&result.stdout) {
        Ok(trace) => ResponseEnvelope::VisualizationSuccess(trace),
        Err(failure) => failure.into_envelope(&result.stderr),
    }
}
