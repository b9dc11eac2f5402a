//! HTTP Request/Response Types

use serde::{Deserialize, Serialize};

/// POST /api/query and POST /api/visualize body
pub use jqlite_core::domain::RawQueryRequest as QueryBody;

/// GET /api/health body
pub use jqlite_core::domain::HealthReport as HealthBody;

/// Body of every 4xx/5xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
