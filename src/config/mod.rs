//! Configuration
//!
//! JSON5 file with camelCase keys. Every section is optional; a missing file
//! yields the defaults. The raw file is also available as a `serde_json::Value`
//! for the `config get/set` commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::logging::LoggingConfig;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "DESKADMIN_CONFIG";

/// Backend base URL override.
pub const BASE_URL_ENV: &str = "ADMIN_API_BASE_URI";

/// Backend base URL override shared with the browser build.
pub const PUBLIC_BASE_URL_ENV: &str = "NEXT_PUBLIC_ADMIN_API_BASE_URI";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PROXY_PORT: u16 = 3100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// One problem found by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub path: String,
    pub message: String,
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.path, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub backend: BackendConfig,
    pub proxy: ProxyConfig,
    pub list: ListConfig,
    pub logging: LoggingConfig,
}

/// REST backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            api_token: None,
        }
    }
}

/// Local forwarding proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PROXY_PORT,
        }
    }
}

/// List screen defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListConfig {
    /// Overrides every resource's page size when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    pub debounce_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            debounce_ms: 500,
        }
    }
}

impl Config {
    /// Load and validate the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = load_config_uncached(path)?;
        let config = Self::from_value(raw, path)?;
        config.validate()?;
        Ok(config)
    }

    fn from_value(value: Value, path: &Path) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply the base URL precedence: explicit flag, then the environment,
    /// then whatever the file said.
    pub fn resolve_base_url(&mut self, explicit: Option<&str>) {
        self.resolve_base_url_with(explicit, |key| std::env::var(key).ok());
    }

    pub fn resolve_base_url_with<F>(&mut self, explicit: Option<&str>, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolved = explicit
            .map(str::to_string)
            .or_else(|| env(BASE_URL_ENV))
            .or_else(|| env(PUBLIC_BASE_URL_ENV))
            .filter(|url| !url.trim().is_empty());
        if let Some(url) = resolved {
            debug!(base_url = %url, "backend base URL overridden");
            self.backend.base_url = url;
        }
    }

    /// Check values that would otherwise fail at first use.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        match url::Url::parse(&self.backend.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => issues.push(ConfigIssue {
                path: "backend.baseUrl".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => issues.push(ConfigIssue {
                path: "backend.baseUrl".to_string(),
                message: e.to_string(),
            }),
        }
        if self.backend.timeout_seconds == 0 {
            issues.push(ConfigIssue {
                path: "backend.timeoutSeconds".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.proxy.port == 0 {
            issues.push(ConfigIssue {
                path: "proxy.port".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.list.page_size == Some(0) {
            issues.push(ConfigIssue {
                path: "list.pageSize".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }
}

/// Resolved config file path: `$DESKADMIN_CONFIG` or
/// `<config dir>/deskadmin/config.json5`.
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("deskadmin")
        .join("config.json5")
}

/// Raw config at the default location.
pub fn load_config() -> Result<Value> {
    load_config_uncached(&get_config_path())
}

/// Read and parse a config file. A missing file is an empty object.
pub fn load_config_uncached(path: &Path) -> Result<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    json5::from_str::<Value>(&raw).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write a config value, replacing the file atomically.
pub fn persist_config_file(path: &Path, value: &Value) -> Result<()> {
    let write_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let pretty = serde_json::to_string_pretty(value).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json5.tmp");
    std::fs::write(&tmp, pretty + "\n").map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.proxy.port, DEFAULT_PROXY_PORT);
        assert_eq!(config.list.debounce_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json5");
        assert_eq!(load_config_uncached(&path).unwrap(), serde_json::json!({}));
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_json5_file_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(
            &path,
            r#"{
                // staging backend
                backend: { baseUrl: "https://admin.example.com/api", timeoutSeconds: 5, apiToken: "s3cret" },
                list: { pageSize: 25 },
                logging: { level: "debug", format: "json" },
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend.base_url, "https://admin.example.com/api");
        assert_eq!(config.backend.timeout_seconds, 5);
        assert_eq!(config.backend.api_token.as_deref(), Some("s3cret"));
        assert_eq!(config.list.page_size, Some(25));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.proxy, ProxyConfig::default());
    }

    #[test]
    fn test_validate_collects_issues() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://files".to_string();
        config.proxy.port = 0;
        match config.validate() {
            Err(ConfigError::Invalid(issues)) => {
                let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
                assert_eq!(paths, vec!["backend.baseUrl", "proxy.port"]);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_base_url_precedence() {
        let env = |key: &str| match key {
            BASE_URL_ENV => Some("http://primary/api".to_string()),
            PUBLIC_BASE_URL_ENV => Some("http://public/api".to_string()),
            _ => None,
        };
        let mut config = Config::default();
        config.resolve_base_url_with(Some("http://flag/api"), env);
        assert_eq!(config.backend.base_url, "http://flag/api");

        let mut config = Config::default();
        config.resolve_base_url_with(None, env);
        assert_eq!(config.backend.base_url, "http://primary/api");

        let mut config = Config::default();
        config.resolve_base_url_with(None, |key| {
            (key == PUBLIC_BASE_URL_ENV).then(|| "http://public/api".to_string())
        });
        assert_eq!(config.backend.base_url, "http://public/api");

        let mut config = Config::default();
        config.backend.base_url = "http://file/api".to_string();
        config.resolve_base_url_with(None, |_| None);
        assert_eq!(config.backend.base_url, "http://file/api");
    }

    #[test]
    fn test_persist_round_trips_through_json5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json5");
        let value = serde_json::json!({ "proxy": { "port": 4000 } });
        persist_config_file(&path, &value).unwrap();
        assert_eq!(load_config_uncached(&path).unwrap(), value);
        assert!(!path.with_extension("json5.tmp").exists());
    }
}
