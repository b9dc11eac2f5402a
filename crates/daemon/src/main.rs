//! jqlite Gateway - Main Entry Point
//! HTTP bridge between browser clients and the jqlite engine binaries

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::GatewayConfig;
use jqlite_api_http::HttpServer;
use jqlite_core::application::{shutdown_channel, QueryBridge};
use jqlite_core::port::id_provider::UuidProvider;
use jqlite_core::port::time_provider::SystemTimeProvider;
use jqlite_infra_system::{BoundedProcessInvoker, TempFileInputStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (invalid values abort startup)
    let config = GatewayConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init(config.log_format, config.log_dir.as_deref())
        .context("Failed to initialize logging")?;

    info!("jqlite gateway v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let invoker = Arc::new(BoundedProcessInvoker::new(
        time_provider,
        config.env_allowlist.clone(),
    ));
    let store = Arc::new(TempFileInputStore::new(config.input_dir.clone()));

    info!(
        input_dir = %config.input_dir.display(),
        timeout_ms = config.engines.limits.timeout.as_millis() as u64,
        max_output_bytes = config.engines.limits.max_output_bytes,
        overflow_policy = %config.engines.limits.overflow_policy,
        "Engine limits configured"
    );

    let bridge = Arc::new(QueryBridge::new(
        store,
        invoker,
        id_provider,
        config.engines.clone(),
    ));

    // 4. Report engine availability
    let health = bridge.health().await;
    if health.jqlite_available {
        info!(path = %health.jqlite_path, "jqlite engine available");
    } else {
        warn!(path = %health.jqlite_path, "jqlite engine not found; queries will fail");
    }
    if health.visualization_available {
        info!(path = %health.visualization_path, "Visualization engine available");
    } else {
        warn!(
            path = %health.visualization_path,
            "Visualization engine not found; /api/visualize will report it unavailable"
        );
    }

    // 5. Start HTTP server
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let server = HttpServer::new(config.http.clone(), bridge);
    let handle = server
        .start(shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server start failed: {}", e))?;

    info!(addr = %handle.local_addr(), "System ready. Waiting for requests...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Draining in-flight requests...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    match tokio::time::timeout(SHUTDOWN_GRACE, handle.stopped()).await {
        Ok(Ok(())) => info!("Shutdown complete."),
        Ok(Err(e)) => warn!(error = %e, "HTTP server stopped with error"),
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "In-flight requests did not finish in time; exiting"
        ),
    }

    Ok(())
}
