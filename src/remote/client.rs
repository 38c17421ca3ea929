use super::body::StagedBody;
use super::{Method, ToolingApi};
use crate::errors::RemoteError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::Command;
use uuid::Uuid;

/// Tooling API version used in resource URLs.
pub const DEFAULT_API_VERSION: &str = "65.0";

/// Default platform CLI command.
pub const DEFAULT_SF_CMD: &str = "sf";

/// Tooling API client backed by the platform CLI.
///
/// Queries run through `sf data query --use-tooling-api --json` and resource
/// requests through `sf api request rest`. Request bodies are staged in
/// per-call temporary files named from this client's token and a sequence
/// number, so concurrent calls never share a file.
pub struct SfCliClient {
    sf_cmd: String,
    api_version: String,
    target_org: Option<String>,
    staging_dir: PathBuf,
    token: Uuid,
    sequence: AtomicU64,
}

/// JSON envelope printed by `sf data query --json`.
#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    records: Vec<Value>,
}

impl SfCliClient {
    pub fn new(sf_cmd: impl Into<String>) -> Self {
        Self {
            sf_cmd: sf_cmd.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            target_org: None,
            staging_dir: std::env::temp_dir(),
            token: Uuid::new_v4(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Target a named org; `None` uses the CLI's default org.
    pub fn with_target_org(mut self, target_org: Option<String>) -> Self {
        self.target_org = target_org;
        self
    }

    /// Directory where request bodies are staged (default: system temp dir).
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn target_org(&self) -> Option<&str> {
        self.target_org.as_deref()
    }

    /// Full URL of a resource in the versioned tooling namespace.
    pub fn resource_url(&self, resource: &str) -> String {
        format!("/services/data/v{}/tooling{}", self.api_version, resource)
    }

    fn next_body_name(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("sf_compile_{}_{}.json", self.token.simple(), seq)
    }

    fn push_target_org(&self, args: &mut Vec<String>) {
        if let Some(org) = &self.target_org {
            args.push("--target-org".to_string());
            args.push(org.clone());
        }
    }

    /// Run the CLI and return its stdout.
    ///
    /// The CLI prints structured JSON failures on stdout with a non-zero
    /// exit, so stdout wins whenever it has content.
    async fn run_cli(&self, args: &[String]) -> Result<String, RemoteError> {
        tracing::debug!(command = %self.sf_cmd, args = ?args, "invoking tooling CLI");

        let output = Command::new(&self.sf_cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RemoteError::Spawn {
                command: self.sf_cmd.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() || !stdout.trim().is_empty() {
            return Ok(stdout);
        }

        let stderr = strip_cli_warnings(&String::from_utf8_lossy(&output.stderr));
        let message = if stderr.is_empty() {
            format!("'{}' exited with {}", self.sf_cmd, output.status)
        } else {
            stderr
        };
        Err(RemoteError::Cli { message })
    }
}

#[async_trait]
impl ToolingApi for SfCliClient {
    async fn query(&self, statement: &str) -> Result<Vec<Value>, RemoteError> {
        let mut args: Vec<String> = [
            "data",
            "query",
            "--query",
            statement,
            "--use-tooling-api",
            "--json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        self.push_target_org(&mut args);

        let output = self.run_cli(&args).await?;
        parse_query_output(&output)
    }

    async fn request(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        let mut args = vec![
            "api".to_string(),
            "request".to_string(),
            "rest".to_string(),
            self.resource_url(resource),
            "--method".to_string(),
            method.as_str().to_string(),
        ];
        self.push_target_org(&mut args);

        let staged = match body {
            Some(body) => Some(StagedBody::write(
                &self.staging_dir,
                &self.next_body_name(),
                body,
            )?),
            None => None,
        };
        if let Some(staged) = &staged {
            args.push("--body".to_string());
            args.push(staged.cli_arg());
        }

        let output = self.run_cli(&args).await;
        drop(staged);
        parse_request_output(&output?)
    }
}

/// Drop the CLI's `Warning:` lines from stderr.
fn strip_cli_warnings(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| !line.starts_with("Warning:"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn parse_query_output(output: &str) -> Result<Vec<Value>, RemoteError> {
    let envelope: QueryEnvelope = serde_json::from_str(output)?;
    if envelope.status != 0 {
        return Err(RemoteError::Query {
            message: envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Tooling API query failed".to_string()),
        });
    }
    Ok(envelope.result.map(|r| r.records).unwrap_or_default())
}

/// Parse a REST response, turning error-shaped payloads into `RemoteError::Api`.
fn parse_request_output(output: &str) -> Result<Value, RemoteError> {
    if output.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let value: Value = serde_json::from_str(output)?;
    if let Some(first) = value.as_array().and_then(|entries| entries.first())
        && let Some(code) = first.get("errorCode").and_then(error_code)
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(RemoteError::Api { code, message });
    }
    Ok(value)
}

/// An `errorCode` value that marks the payload as an error, if any.
fn error_code(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(code) if code.is_empty() => None,
        Value::String(code) => Some(code.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Write an executable shell script standing in for the `sf` CLI.
#[cfg(all(test, unix))]
pub(crate) fn write_fake_cli(dir: &std::path::Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-sf");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
