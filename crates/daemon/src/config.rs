//! Gateway configuration from environment variables

use anyhow::{anyhow, Context, Result};
use jqlite_api_http::HttpServerConfig;
use jqlite_core::domain::{EngineSettings, InvocationLimits, OverflowPolicy};
use jqlite_infra_system::{default_input_dir, DEFAULT_ENV_ALLOWLIST};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ENGINE_PATH: &str = "./jqlite";
const DEFAULT_VIZ_ENGINE_PATH: &str = "./jqlite_viz";
const DEFAULT_PORT: u16 = 3000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format '{}' (expected 'pretty' or 'json')", other)),
        }
    }
}

/// Everything the daemon needs to wire the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http: HttpServerConfig,
    pub engines: EngineSettings,
    pub input_dir: PathBuf,
    pub env_allowlist: Vec<String>,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl GatewayConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cwd = std::env::current_dir().context("Failed to read working directory")?;

        let port = match get("JQLITE_PORT").or_else(|| get("PORT")) {
            Some(raw) => parse_number::<u16>("JQLITE_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let mut http = HttpServerConfig {
            port,
            ..Default::default()
        };
        if let Some(host) = get("JQLITE_HOST") {
            http.host = host;
        }
        if let Some(raw) = get("JQLITE_MAX_BODY_BYTES") {
            http.max_body_bytes = parse_number("JQLITE_MAX_BODY_BYTES", &raw)?;
        }
        if let Some(dir) = get("JQLITE_STATIC_DIR") {
            http.static_dir = Some(expand_path(&dir, &cwd));
        }

        let mut limits = InvocationLimits::default();
        if let Some(raw) = get("JQLITE_TIMEOUT_MS") {
            limits.timeout = Duration::from_millis(parse_number("JQLITE_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = get("JQLITE_MAX_OUTPUT_BYTES") {
            limits.max_output_bytes = parse_number("JQLITE_MAX_OUTPUT_BYTES", &raw)?;
        }
        if let Some(raw) = get("JQLITE_OVERFLOW_POLICY") {
            limits.overflow_policy = raw
                .parse::<OverflowPolicy>()
                .context("Invalid JQLITE_OVERFLOW_POLICY")?;
        }

        let query_engine = expand_path(
            &get("JQLITE_ENGINE_PATH").unwrap_or_else(|| DEFAULT_ENGINE_PATH.to_string()),
            &cwd,
        );
        let visualization_engine = expand_path(
            &get("JQLITE_VIZ_ENGINE_PATH").unwrap_or_else(|| DEFAULT_VIZ_ENGINE_PATH.to_string()),
            &cwd,
        );

        let engines = EngineSettings::new(query_engine, visualization_engine).with_limits(limits);
        engines.validate().context("Invalid engine settings")?;

        let input_dir = get("JQLITE_INPUT_DIR")
            .map(|dir| expand_path(&dir, &cwd))
            .unwrap_or_else(default_input_dir);

        let env_allowlist = match get("JQLITE_ENV_ALLOWLIST") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        };

        let log_format = match get("JQLITE_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            http,
            engines,
            input_dir,
            env_allowlist,
            log_format,
            log_dir: get("JQLITE_LOG_DIR").map(|dir| expand_path(&dir, &cwd)),
        })
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("Invalid {}='{}': {}", key, raw, e))
}

/// Tilde-expand and make absolute against `cwd`
fn expand_path(raw: &str, cwd: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw.trim()).into_owned());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    normalize(&absolute)
}

/// Drop `.` components so reported paths read cleanly
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
