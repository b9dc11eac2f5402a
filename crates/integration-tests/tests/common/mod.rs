//! Shared harness: a real gateway on an ephemeral port backed by fake engines

#![allow(dead_code)]

use jqlite_api_http::{HttpServer, HttpServerConfig, HttpServerHandle};
use jqlite_core::application::{shutdown_channel, QueryBridge, ShutdownSender};
use jqlite_core::domain::{EngineSettings, InvocationLimits};
use jqlite_core::port::id_provider::UuidProvider;
use jqlite_core::port::time_provider::SystemTimeProvider;
use jqlite_infra_system::{BoundedProcessInvoker, TempFileInputStore};
use serde_json::{json, Value};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Write an executable `/bin/sh` script
pub fn write_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub struct GatewayBuilder {
    dir: TempDir,
    query_engine: PathBuf,
    visualization_engine: PathBuf,
    limits: InvocationLimits,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let query_engine = dir.path().join("jqlite");
        let visualization_engine = dir.path().join("jqlite_viz");
        Self {
            dir,
            query_engine,
            visualization_engine,
            limits: InvocationLimits::default(),
        }
    }

    /// Install a fake query engine; `$1` is the query, `$2` the input file
    pub fn query_engine(self, body: &str) -> Self {
        write_engine(self.dir.path(), "jqlite", body);
        self
    }

    /// Install a fake visualization engine; `$1` is `--visualize`
    pub fn visualization_engine(self, body: &str) -> Self {
        write_engine(self.dir.path(), "jqlite_viz", body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.limits.timeout = timeout;
        self
    }

    pub fn max_output_bytes(mut self, limit: usize) -> Self {
        self.limits.max_output_bytes = limit;
        self
    }

    pub async fn start(self) -> TestGateway {
        let input_dir = self.dir.path().join("inputs");
        let settings = EngineSettings::new(self.query_engine, self.visualization_engine)
            .with_limits(self.limits);

        let bridge = Arc::new(QueryBridge::new(
            Arc::new(TempFileInputStore::new(input_dir.clone())),
            Arc::new(BoundedProcessInvoker::new(
                Arc::new(SystemTimeProvider),
                vec!["PATH".to_string()],
            )),
            Arc::new(UuidProvider),
            settings,
        ));

        let config = HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: None,
            ..Default::default()
        };

        let (shutdown, token) = shutdown_channel();
        let handle = HttpServer::new(config, bridge).start(token).await.unwrap();

        TestGateway {
            base_url: format!("http://{}", handle.local_addr()),
            client: reqwest::Client::new(),
            input_dir,
            shutdown,
            handle: Some(handle),
            _dir: self.dir,
        }
    }
}

pub struct TestGateway {
    pub base_url: String,
    pub client: reqwest::Client,
    pub input_dir: PathBuf,
    shutdown: ShutdownSender,
    handle: Option<HttpServerHandle>,
    _dir: TempDir,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `{json_data, query_string}` and return (status, body)
    pub async fn post(&self, path: &str, json_data: &str, query_string: &str) -> (u16, Value) {
        self.post_raw(
            path,
            json!({ "json_data": json_data, "query_string": query_string }),
        )
        .await
    }

    pub async fn post_raw(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn health(&self) -> Value {
        self.client
            .get(self.url("/api/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Files left behind in the transient input directory
    pub fn leftover_inputs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.input_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Signal shutdown and wait for the serve loop to drain
    pub async fn stop(mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(Duration::from_secs(5), handle.stopped())
                .await
                .expect("server did not stop in time")
                .unwrap();
        }
    }
}
