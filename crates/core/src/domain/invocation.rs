// Process Invocation Domain Model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::error::DomainError;

/// Default wall-clock limit for one engine run (5s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default ceiling for combined stdout + stderr (10 MB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// What to do when captured output exceeds `max_output_bytes`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Kill the process and report `ExitError::OutputLimitExceeded`
    #[default]
    Abort,
    /// Keep the first `max_output_bytes`, discard the rest, let the process finish
    Truncate,
}

impl FromStr for OverflowPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "truncate" => Ok(Self::Truncate),
            other => Err(DomainError::InvalidSettings(format!(
                "unknown overflow policy '{}' (expected 'abort' or 'truncate')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowPolicy::Abort => write!(f, "abort"),
            OverflowPolicy::Truncate => write!(f, "truncate"),
        }
    }
}

/// Resource bounds applied to every invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for InvocationLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl InvocationLimits {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.timeout.is_zero() {
            return Err(DomainError::InvalidSettings(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(DomainError::InvalidSettings(
                "max output bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Human readable timeout ("5 seconds", "1 second", "250 ms")
    pub fn timeout_label(&self) -> String {
        let millis = self.timeout.as_millis();
        match millis {
            1000 => "1 second".to_string(),
            m if m % 1000 == 0 => format!("{} seconds", m / 1000),
            m => format!("{} ms", m),
        }
    }
}

/// One external process run: program, discrete argv, bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub limits: InvocationLimits,
}

/// Why a process did not exit cleanly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExitError {
    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Process exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("Process terminated by signal {signal}")]
    Signal { signal: i32 },

    #[error("Process timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("Output exceeded the limit of {limit} bytes")]
    OutputLimitExceeded { limit: usize },

    #[error("I/O error while waiting for process: {0}")]
    Io(String),
}

/// Outcome of one invocation. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocationResult {
    pub exit_error: Option<ExitError>,
    pub killed_by_timeout: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl ProcessInvocationResult {
    /// Clean exit with the given streams
    pub fn exited(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_error: None,
            killed_by_timeout: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Process that never started
    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failed(
            ExitError::Spawn {
                program: program.into(),
                reason: reason.into(),
            },
            "",
            "",
        )
    }

    pub fn failed(
        exit_error: ExitError,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            exit_error: Some(exit_error),
            killed_by_timeout: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_error: Some(ExitError::TimedOut {
                timeout_ms: timeout.as_millis() as u64,
            }),
            killed_by_timeout: true,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: timeout.as_millis() as i64,
        }
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_parse() {
        assert_eq!("abort".parse::<OverflowPolicy>().unwrap(), OverflowPolicy::Abort);
        assert_eq!(
            " Truncate ".parse::<OverflowPolicy>().unwrap(),
            OverflowPolicy::Truncate
        );
        assert!("drop".parse::<OverflowPolicy>().is_err());
    }

    #[test]
    fn test_timeout_label() {
        let mut limits = InvocationLimits::default();
        assert_eq!(limits.timeout_label(), "5 seconds");

        limits.timeout = Duration::from_secs(1);
        assert_eq!(limits.timeout_label(), "1 second");

        limits.timeout = Duration::from_millis(250);
        assert_eq!(limits.timeout_label(), "250 ms");
    }

    #[test]
    fn test_limits_validation() {
        assert!(InvocationLimits::default().validate().is_ok());

        let zero_timeout = InvocationLimits {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_output = InvocationLimits {
            max_output_bytes: 0,
            ..Default::default()
        };
        assert!(zero_output.validate().is_err());
    }

    #[test]
    fn test_exit_error_messages() {
        let err = ExitError::Spawn {
            program: "/opt/jqlite".to_string(),
            reason: "No such file or directory (os error 2)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to spawn /opt/jqlite: No such file or directory (os error 2)"
        );
        assert_eq!(
            ExitError::NonZeroExit { code: 3 }.to_string(),
            "Process exited with code 3"
        );
    }
}
