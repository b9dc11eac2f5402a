// Engine Domain Model - which executable runs, with which argv

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::DomainError;
use super::invocation::{InvocationLimits, InvocationSpec};

/// Flag that switches the visualization engine into trace mode
pub const VISUALIZE_FLAG: &str = "--visualize";

/// The two external engines behind the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Query,
    Visualization,
}

impl EngineKind {
    /// Build the argv for this engine
    ///
    /// Query: `[query, input]`. Visualization: `["--visualize", query, input]`.
    pub fn args(&self, query: &str, input_path: &Path) -> Vec<String> {
        let input = input_path.to_string_lossy().into_owned();
        match self {
            EngineKind::Query => vec![query.to_string(), input],
            EngineKind::Visualization => {
                vec![VISUALIZE_FLAG.to_string(), query.to_string(), input]
            }
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Query => write!(f, "query"),
            EngineKind::Visualization => write!(f, "visualization"),
        }
    }
}

/// Resolved engine locations plus invocation bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub query_engine: PathBuf,
    pub visualization_engine: PathBuf,
    pub limits: InvocationLimits,
}

impl EngineSettings {
    pub fn new(query_engine: impl Into<PathBuf>, visualization_engine: impl Into<PathBuf>) -> Self {
        Self {
            query_engine: query_engine.into(),
            visualization_engine: visualization_engine.into(),
            limits: InvocationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: InvocationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.limits.validate()
    }

    pub fn program(&self, kind: EngineKind) -> &Path {
        match kind {
            EngineKind::Query => &self.query_engine,
            EngineKind::Visualization => &self.visualization_engine,
        }
    }

    /// Invocation for one request against the given input file
    pub fn invocation(&self, kind: EngineKind, query: &str, input_path: &Path) -> InvocationSpec {
        InvocationSpec {
            program: self.program(kind).to_path_buf(),
            args: kind.args(query, input_path),
            limits: self.limits,
        }
    }
}

/// GET /api/health body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub jqlite_available: bool,
    pub jqlite_path: String,
    pub visualization_available: bool,
    pub visualization_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args() {
        let args = EngineKind::Query.args(".a | .b", Path::new("/tmp/input-1.json"));
        assert_eq!(args, vec![".a | .b", "/tmp/input-1.json"]);
    }

    #[test]
    fn test_visualization_args() {
        let args = EngineKind::Visualization.args(".a", Path::new("/tmp/input-2.json"));
        assert_eq!(args, vec!["--visualize", ".a", "/tmp/input-2.json"]);
    }

    #[test]
    fn test_invocation_uses_engine_path() {
        let settings = EngineSettings::new("/opt/jqlite", "/opt/jqlite_viz");
        let spec = settings.invocation(EngineKind::Visualization, ".", Path::new("in.json"));

        assert_eq!(spec.program, PathBuf::from("/opt/jqlite_viz"));
        assert_eq!(spec.args.len(), 3);
        assert_eq!(spec.limits, InvocationLimits::default());
    }

    #[test]
    fn test_query_string_is_never_split() {
        // Shell metacharacters stay inside one argv entry
        let args = EngineKind::Query.args("; rm -rf / #", Path::new("in.json"));
        assert_eq!(args[0], "; rm -rf / #");
        assert_eq!(args.len(), 2);
    }
}
