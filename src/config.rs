//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables** — `WHOAMID_LISTEN`, `WHOAMID_IMDS_BASE_URL`
//! 2. **Config file** — path via `--config <path>`, or `whoamid.toml` in CWD
//! 3. **Compiled defaults** — see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:3000"
//!
//! [imds]
//! base_url = "http://169.254.169.254"
//! timeout_ms = 2000
//! token_ttl_secs = 21600
//!
//! [logging]
//! level = "info"
//! ```

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub imds: ImdsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default `0.0.0.0:3000`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Instance metadata service client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ImdsConfig {
    /// Base URL of the metadata endpoint (default `http://169.254.169.254`).
    /// Override with `WHOAMID_IMDS_BASE_URL`, e.g. to point at a mock.
    #[serde(default = "default_imds_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds (default 2000). The link-local
    /// metadata endpoint either answers fast or not at all.
    #[serde(default = "default_imds_timeout_ms")]
    pub timeout_ms: u64,
    /// Requested IMDSv2 session token TTL in seconds (default 21600, the
    /// service maximum).
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_imds_base_url() -> String {
    "http://169.254.169.254".to_string()
}
fn default_imds_timeout_ms() -> u64 {
    2000
}
fn default_token_ttl_secs() -> u64 {
    21600
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for ImdsConfig {
    fn default() -> Self {
        Self {
            base_url: default_imds_base_url(),
            timeout_ms: default_imds_timeout_ms(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, reads that file (panics on failure). Otherwise looks
    /// for `whoamid.toml` in the current directory, falling back to compiled
    /// defaults.
    pub fn load(path: Option<&str>) -> Self {
        let mut config = if let Some(p) = path {
            let content = std::fs::read_to_string(p)
                .unwrap_or_else(|e| panic!("Failed to read config file {p}: {e}"));
            toml::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse config file {p}: {e}"))
        } else if Path::new("whoamid.toml").exists() {
            let content =
                std::fs::read_to_string("whoamid.toml").expect("Failed to read whoamid.toml");
            toml::from_str(&content).expect("Failed to parse whoamid.toml")
        } else {
            Config {
                server: ServerConfig::default(),
                imds: ImdsConfig::default(),
                logging: LoggingConfig::default(),
            }
        };

        // Env var overrides
        if let Ok(listen) = std::env::var("WHOAMID_LISTEN") {
            config.server.listen = listen;
        }
        if let Ok(url) = std::env::var("WHOAMID_IMDS_BASE_URL") {
            config.imds.base_url = url;
        }

        config
    }
}
