//! Client config load/save for `~/.rag-query/config.yaml`.
//! Schema: `endpoint.url`, `endpoint.timeout_secs`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Route served by the reference answering service.
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:8000/api/v1/query/";

/// Per-request timeout when the config file does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Endpoint section (url, timeout_secs).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EndpointSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Full config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointSection,
}

impl Config {
    /// Configured endpoint URL, falling back to [`DEFAULT_ENDPOINT_URL`].
    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT_URL)
    }

    /// Per-request timeout, falling back to [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Copy of this config with every default written out explicitly.
    pub fn resolved(&self) -> Config {
        Config {
            endpoint: EndpointSection {
                url: Some(self.endpoint_url().to_string()),
                timeout_secs: Some(self.timeout().as_secs()),
            },
        }
    }
}

/// Returns the default config file path: `~/.rag-query/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".rag-query").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file. An empty file yields the defaults.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(&contents)?)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
