//! HTTP API Layer
//!
//! Exposes the query bridge over HTTP:
//! - `POST /api/query`
//! - `POST /api/visualize`
//! - `GET /api/health`

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{HttpServer, HttpServerConfig, HttpServerHandle};
