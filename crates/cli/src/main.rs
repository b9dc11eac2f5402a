//! jqlite CLI - Command-line client for a running jqlite gateway

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tabled::{Table, Tabled};

const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "jqlite-cli")]
#[command(about = "Client for the jqlite HTTP gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway base URL
    #[arg(long, env = "JQLITE_URL", default_value = DEFAULT_GATEWAY_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against a JSON document
    Query(QueryArgs),

    /// Run a query and print the engine's execution trace
    Visualize(QueryArgs),

    /// Show engine availability
    Health,
}

#[derive(Args)]
struct QueryArgs {
    /// Query expression (e.g. ".a")
    #[arg(short, long)]
    query: String,

    /// JSON document as a literal string
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    data: Option<String>,

    /// Read the JSON document from a file
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl QueryArgs {
    fn json_data(&self) -> Result<String> {
        match (&self.data, &self.file) {
            (Some(data), _) => Ok(data.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => anyhow::bail!("Either --data or --file is required"),
        }
    }
}

#[derive(Serialize)]
struct QueryRequest {
    json_data: String,
    query_string: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    jqlite_available: bool,
    jqlite_path: String,
    visualization_available: bool,
    visualization_path: String,
}

#[derive(Tabled)]
struct EngineRow {
    engine: &'static str,
    available: String,
    path: String,
}

impl HealthResponse {
    fn rows(&self) -> Vec<EngineRow> {
        vec![
            EngineRow {
                engine: "jqlite",
                available: yes_no(self.jqlite_available),
                path: self.jqlite_path.clone(),
            },
            EngineRow {
                engine: "visualization",
                available: yes_no(self.visualization_available),
                path: self.visualization_path.clone(),
            },
        ]
    }
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "yes" } else { "no" };
    label.to_string()
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// POST a query body and return the decoded JSON response
///
/// Non-2xx responses still carry an `{"error": ...}` body, so the body is
/// decoded regardless of status.
async fn post_query(url: &str, request: &QueryRequest) -> Result<Value> {
    let client = reqwest::Client::new();
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .context("Failed to connect to gateway")?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse response (HTTP {})", status))?;
    Ok(body)
}

async fn fetch_health(url: &str) -> Result<HealthResponse> {
    reqwest::get(url)
        .await
        .context("Failed to connect to gateway")?
        .json()
        .await
        .context("Failed to parse response")
}

/// Extract the `error` field of an envelope, if any
fn envelope_error(body: &Value) -> Option<&str> {
    body.get("error").and_then(Value::as_str)
}

fn print_error(body: &Value) {
    if let Some(error) = envelope_error(body) {
        eprintln!("{} {}", "✗".red().bold(), error.red());
    }
    if let Some(stderr) = body.get("stderr").and_then(Value::as_str) {
        if !stderr.is_empty() {
            eprintln!("{}", "stderr:".yellow().bold());
            eprintln!("{}", stderr);
        }
    }
    if let Some(raw) = body.get("raw_output").and_then(Value::as_str) {
        eprintln!("{}", "raw output:".yellow().bold());
        eprintln!("{}", raw);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Query(args) => {
            let request = QueryRequest {
                json_data: args.json_data()?,
                query_string: args.query.clone(),
            };
            let body = post_query(&endpoint(&cli.url, "/api/query"), &request).await?;

            match body.get("result").and_then(Value::as_str) {
                Some(result) if envelope_error(&body).is_none() => {
                    println!("{}", result);
                    true
                }
                _ => {
                    print_error(&body);
                    false
                }
            }
        }

        Commands::Visualize(args) => {
            let request = QueryRequest {
                json_data: args.json_data()?,
                query_string: args.query.clone(),
            };
            let body = post_query(&endpoint(&cli.url, "/api/visualize"), &request).await?;

            if envelope_error(&body).is_some() {
                print_error(&body);
                false
            } else {
                println!("{}", serde_json::to_string_pretty(&body)?);
                true
            }
        }

        Commands::Health => {
            println!("{}", "Gateway Health".cyan().bold());
            println!();

            match fetch_health(&endpoint(&cli.url, "/api/health")).await {
                Ok(health) => {
                    println!("  {} {}", "URL:".bold(), cli.url);
                    println!("  {} {}", "Status:".bold(), health.status.green());
                    println!();
                    println!("{}", Table::new(health.rows()));
                    health.jqlite_available
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {:#}", "Error:".bold(), e);
                    false
                }
            }
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:3000/", "/api/query"),
            "http://localhost:3000/api/query"
        );
        assert_eq!(
            endpoint("http://localhost:3000", "/api/health"),
            "http://localhost:3000/api/health"
        );
    }

    #[test]
    fn test_envelope_error() {
        assert_eq!(
            envelope_error(&json!({"error": "Execution error: boom"})),
            Some("Execution error: boom")
        );
        assert_eq!(envelope_error(&json!({"result": "1"})), None);
        // A trace is any object without an `error` string
        assert_eq!(envelope_error(&json!({"steps": []})), None);
    }

    #[test]
    fn test_query_args_prefers_literal_data() {
        let args = QueryArgs {
            query: ".a".to_string(),
            data: Some("{\"a\":1}".to_string()),
            file: None,
        };
        assert_eq!(args.json_data().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_query_args_missing_file_is_error() {
        let args = QueryArgs {
            query: ".a".to_string(),
            data: None,
            file: Some(PathBuf::from("/definitely/not/here.json")),
        };
        assert!(args.json_data().is_err());
    }

    #[test]
    fn test_cli_parses_query_subcommand() {
        let cli = Cli::try_parse_from([
            "jqlite-cli",
            "--url",
            "http://gateway:3000",
            "query",
            "--query",
            ".a",
            "--data",
            "{\"a\":1}",
        ])
        .unwrap();
        assert_eq!(cli.url, "http://gateway:3000");
        assert!(matches!(cli.command, Commands::Query(_)));
    }

    #[test]
    fn test_cli_rejects_data_and_file_together() {
        let result = Cli::try_parse_from([
            "jqlite-cli",
            "visualize",
            "-q",
            ".a",
            "-d",
            "{}",
            "-f",
            "input.json",
        ]);
        assert!(result.is_err());
    }
}
