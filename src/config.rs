//! Layered configuration for orgcompile.
//!
//! Values come from `.orgcompile/orgcompile.toml`, then the environment, then
//! CLI flags, later layers winning.
//!
//! ```toml
//! [remote]
//! sf_cmd = "sf"
//! api_version = "65.0"
//! target_org = "my-sandbox"
//!
//! [compile]
//! concurrency = 10
//! poll_interval_ms = 2000
//! ```

use crate::compile::{CompileSettings, DEFAULT_CONCURRENCY};
use crate::remote::{DEFAULT_API_VERSION, DEFAULT_SF_CMD, SfCliClient};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the config file, relative to the project.
pub const CONFIG_DIR: &str = ".orgcompile";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "orgcompile.toml";

/// How to reach the org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSection {
    /// Platform CLI command (default: "sf", or `SF_CMD`)
    #[serde(default)]
    pub sf_cmd: Option<String>,
    /// Tooling API version used in resource URLs
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Org alias or username; unset uses the CLI's default org
    #[serde(default)]
    pub target_org: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            sf_cmd: None,
            api_version: default_api_version(),
            target_org: None,
        }
    }
}

/// Compile run tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileSection {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for CompileSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Parsed `orgcompile.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileToml {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub compile: CompileSection,
}

impl CompileToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse orgcompile.toml")
    }

    /// Load from `config_dir`, or defaults if the file doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize orgcompile.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// CLI command (file → `SF_CMD` → default).
    pub fn sf_cmd(&self) -> String {
        self.remote
            .sf_cmd
            .clone()
            .or_else(|| std::env::var("SF_CMD").ok())
            .unwrap_or_else(|| DEFAULT_SF_CMD.to_string())
    }

    /// Target org (file → `SF_TARGET_ORG`).
    pub fn target_org(&self) -> Option<String> {
        self.remote
            .target_org
            .clone()
            .or_else(|| std::env::var("SF_TARGET_ORG").ok())
            .filter(|org| !org.trim().is_empty())
    }

    /// Human-readable problems with the configured values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.compile.concurrency == 0 {
            warnings.push(
                "compile.concurrency is 0; members will be staged one at a time".to_string(),
            );
        }
        if self.compile.poll_interval_ms == 0 {
            warnings.push(
                "compile.poll_interval_ms is 0; the compile request will be polled without pause"
                    .to_string(),
            );
        }
        if !is_valid_api_version(&self.remote.api_version) {
            warnings.push(format!(
                "remote.api_version '{}' is not of the form NN.0",
                self.remote.api_version
            ));
        }
        if let Some(cmd) = &self.remote.sf_cmd
            && cmd.trim().is_empty()
        {
            warnings.push("remote.sf_cmd is empty".to_string());
        }

        warnings
    }
}

fn is_valid_api_version(version: &str) -> bool {
    match version.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Values given on the command line; `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub target_org: Option<String>,
    pub sf_cmd: Option<String>,
    pub concurrency: Option<usize>,
    pub poll_interval_ms: Option<u64>,
    pub verbose: bool,
}

/// Runtime configuration for a compile run.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: CompileToml,
    pub cli: CliOverrides,
}

impl Config {
    /// Resolve the project directory and load its `orgcompile.toml`.
    ///
    /// # Arguments
    /// * `project_dir` - project root; must exist, and is canonicalized
    /// * `cli` - command-line values, which win over the file and environment
    ///
    /// A missing config file yields defaults. A malformed one is an error.
    pub fn new(project_dir: PathBuf, cli: CliOverrides) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = CompileToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            cli,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn sf_cmd(&self) -> String {
        self.cli.sf_cmd.clone().unwrap_or_else(|| self.toml.sf_cmd())
    }

    pub fn target_org(&self) -> Option<String> {
        self.cli.target_org.clone().or_else(|| self.toml.target_org())
    }

    pub fn api_version(&self) -> &str {
        &self.toml.remote.api_version
    }

    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    pub fn compile_settings(&self) -> CompileSettings {
        let concurrency = self.cli.concurrency.unwrap_or(self.toml.compile.concurrency);
        let poll_ms = self
            .cli
            .poll_interval_ms
            .unwrap_or(self.toml.compile.poll_interval_ms);
        CompileSettings::default()
            .with_concurrency(concurrency)
            .with_poll_interval(Duration::from_millis(poll_ms))
    }

    /// Tooling client targeting the configured org.
    pub fn tooling_client(&self) -> SfCliClient {
        SfCliClient::new(self.sf_cmd())
            .with_api_version(self.api_version())
            .with_target_org(self.target_org())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &Path, content: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_defaults() {
        let toml = CompileToml::default();
        assert_eq!(toml.remote.api_version, "65.0");
        assert_eq!(toml.compile.concurrency, 10);
        assert_eq!(toml.compile.poll_interval_ms, 2000);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_file_fills_defaults() {
        let toml = CompileToml::parse("[compile]\nconcurrency = 4\n").unwrap();
        assert_eq!(toml.compile.concurrency, 4);
        assert_eq!(toml.compile.poll_interval_ms, 2000);
        assert_eq!(toml.remote.api_version, "65.0");
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let err = CompileToml::parse("[compile\nconcurrency = ").unwrap_err();
        assert!(err.to_string().contains("orgcompile.toml"));
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let toml = CompileToml::parse(
            "[remote]\napi_version = \"latest\"\nsf_cmd = \"\"\n[compile]\nconcurrency = 0\npoll_interval_ms = 0\n",
        )
        .unwrap();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 4);
        assert!(warnings.iter().any(|w| w.contains("api_version")));
        assert!(warnings.iter().any(|w| w.contains("concurrency")));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = CompileToml::default();
        toml.remote.target_org = Some("uat".to_string());
        toml.save(&path).unwrap();
        assert_eq!(CompileToml::load(&path).unwrap(), toml);
    }

    #[test]
    fn test_config_reads_file_values() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            "[remote]\nsf_cmd = \"/opt/sf/bin/sf\"\ntarget_org = \"uat\"\napi_version = \"62.0\"\n[compile]\nconcurrency = 3\npoll_interval_ms = 500\n",
        );
        let config = Config::new(dir.path().to_path_buf(), CliOverrides::default()).unwrap();

        assert_eq!(config.sf_cmd(), "/opt/sf/bin/sf");
        assert_eq!(config.target_org().as_deref(), Some("uat"));
        assert_eq!(config.api_version(), "62.0");
        let settings = config.compile_settings();
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(
            config.tooling_client().resource_url("/sobjects/MetadataContainer"),
            "/services/data/v62.0/tooling/sobjects/MetadataContainer"
        );
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            "[remote]\nsf_cmd = \"sf\"\ntarget_org = \"uat\"\n[compile]\nconcurrency = 3\n",
        );
        let cli = CliOverrides {
            target_org: Some("prod".to_string()),
            sf_cmd: Some("./fake-sf".to_string()),
            concurrency: Some(20),
            poll_interval_ms: Some(10),
            verbose: true,
        };
        let config = Config::new(dir.path().to_path_buf(), cli).unwrap();

        assert_eq!(config.sf_cmd(), "./fake-sf");
        assert_eq!(config.target_org().as_deref(), Some("prod"));
        assert_eq!(config.compile_settings().concurrency, 20);
        assert_eq!(config.compile_settings().poll_interval, Duration::from_millis(10));
        assert!(config.verbose());
        assert_eq!(config.tooling_client().target_org(), Some("prod"));
    }

    #[test]
    fn test_config_missing_project_dir_errors() {
        let dir = tempdir().unwrap();
        let result = Config::new(dir.path().join("missing"), CliOverrides::default());
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to resolve project directory")
        );
    }

    #[test]
    fn test_api_version_format() {
        assert!(is_valid_api_version("65.0"));
        assert!(!is_valid_api_version("65"));
        assert!(!is_valid_api_version("v65.0"));
        assert!(!is_valid_api_version(".0"));
    }
}
