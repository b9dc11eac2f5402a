//! HTTP Handlers
//!
//! Thin adapters from axum extractors to `QueryBridge` use cases.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use jqlite_core::application::QueryBridge;
use jqlite_core::domain::ResponseEnvelope;
use std::sync::Arc;

use crate::error::ApiError;
use crate::types::{HealthBody, QueryBody};

/// Shared handler state
pub type AppState = Arc<QueryBridge>;

/// POST /api/query
pub async fn query(
    State(bridge): State<AppState>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let Json(request) = body?;
    let envelope = bridge.query(request).await?;
    Ok(Json(envelope))
}

/// POST /api/visualize
pub async fn visualize(
    State(bridge): State<AppState>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let Json(request) = body?;
    let envelope = bridge.visualize(request).await?;
    Ok(Json(envelope))
}

/// GET /api/health
pub async fn health(State(bridge): State<AppState>) -> Json<HealthBody> {
    Json(bridge.health().await)
}
