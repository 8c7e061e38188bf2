//! Configuration management for uptrace-monitor.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (UPTRACE_*)
//! 2. Config file (--config, $UPTRACE_CONFIG or the platform config dir)
//! 3. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use uptrace_core::client::{ClientConfig, RetryPolicy, DEFAULT_BASE_URL};

use crate::error::{CliError, CliResult};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Uptrace API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry settings for the HTTP transport
    #[serde(default)]
    pub retry: RetryConfig,

    /// Paths
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the Uptrace API
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Uptrace project id
    pub project_id: Option<String>,

    /// Project token
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where monitor state is kept
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

// Default value functions
fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "uptrace", "uptrace-monitor")
}

fn default_state_dir() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.data_dir().join("state")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".uptrace-monitor")
            .join("state")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            project_id: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(explicit);

        let mut config = Self::load_from(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply UPTRACE_* overrides. `lookup` resolves a variable name.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = set("UPTRACE_API_URL") {
            self.api.url = url;
        }
        if let Some(project_id) = set("UPTRACE_PROJECT_ID") {
            self.api.project_id = Some(project_id);
        }
        if let Some(api_key) = set("UPTRACE_API_KEY") {
            self.api.api_key = Some(api_key);
        }
    }

    /// The file `load` reads: `explicit` if given, `config_path()` otherwise.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("UPTRACE_CONFIG") {
            PathBuf::from(path)
        } else if let Some(proj_dirs) = project_dirs() {
            proj_dirs.config_dir().join("config.toml")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".uptrace-monitor")
                .join("config.toml")
        }
    }

    /// Connection settings for the HTTP transport.
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let project_id = self.api.project_id.clone().ok_or_else(|| {
            CliError::Config("api.project_id is not set (or set UPTRACE_PROJECT_ID)".into())
        })?;
        let api_key = self.api.api_key.clone().ok_or_else(|| {
            CliError::Config("api.api_key is not set (or set UPTRACE_API_KEY)".into())
        })?;

        let mut client = ClientConfig::new(project_id, api_key)
            .with_base_url(self.api.url.clone())
            .with_retry(RetryPolicy {
                max_retries: self.retry.max_retries,
                initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            });
        client.timeout = Duration::from_secs(self.api.timeout_secs);
        Ok(client)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.state_dir)
            .context("Failed to create state directory")?;
        Ok(())
    }
}
