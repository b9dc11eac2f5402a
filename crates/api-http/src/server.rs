//! HTTP Server
//!
//! Routes, middleware (CORS, tracing, body limit, static files) and the
//! serve loop with graceful shutdown.

use crate::handler::{self, AppState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use jqlite_core::application::ShutdownToken;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "public";

/// Request body ceiling (10 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    /// Served for every path outside `/api` when set
    pub static_dir: Option<PathBuf>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

/// Build the application router
pub fn router(state: AppState, config: &HttpServerConfig) -> Router {
    let api = Router::new()
        .route("/api/query", post(handler::query))
        .route("/api/visualize", post(handler::visualize))
        .route("/api/health", get(handler::health))
        .with_state(state);

    let app = match &config.static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Running server
pub struct HttpServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<std::io::Result<()>>,
}

impl HttpServerHandle {
    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the serve loop to finish after shutdown was signalled
    pub async fn stopped(self) -> Result<(), String> {
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("HTTP server failed: {}", e)),
            Err(e) => Err(format!("HTTP server task aborted: {}", e)),
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and start serving in a background task
    ///
    /// In-flight requests are drained once `shutdown` fires.
    pub async fn start(self, shutdown: ShutdownToken) -> Result<HttpServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            max_body_bytes = %self.config.max_body_bytes,
            static_dir = ?self.config.static_dir,
            "Starting HTTP server"
        );

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let app = router(self.state, &self.config);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.wait())
                .await
        });

        info!(addr = %local_addr, "HTTP server started successfully");

        Ok(HttpServerHandle { local_addr, task })
    }
}
