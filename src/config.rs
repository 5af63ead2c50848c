//! Runtime configuration for infer-relay.
//!
//! Configuration is loaded from a JSON file and can be partially overridden on
//! the command line. Every field has a default, so an empty `{}` file (or no
//! file at all) yields a working relay pointed at the stock inference server.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "infer-relay", about = "HTTP relay in front of a KServe v2 inference endpoint")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides `server.listen`).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Downstream inference endpoint.
    pub upstream: UpstreamConfig,

    /// Failure alerting.
    pub alert: AlertConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// HTML page served on `GET /`, read from disk on every request.
    pub index_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            index_path: PathBuf::from("index.html"),
        }
    }
}

/// Downstream inference server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Model repository root; requests go to `{base_url}/{model}/infer`.
    pub base_url: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Model selected at startup.
    pub default_model: String,

    /// Downstream model names behind the switchable aliases.
    pub models: AliasModels,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://10.23.80.35:8000/v2/models".to_string(),
            timeout_secs: 30,
            default_model: "Qwen".to_string(),
            models: AliasModels::default(),
        }
    }
}

impl UpstreamConfig {
    /// Base URL without a trailing slash, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Model names targeted by `POST /qwen` and `POST /mis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasModels {
    pub qwen: String,
    pub mis: String,
}

impl Default for AliasModels {
    fn default() -> Self {
        Self {
            qwen: "Qwen".to_string(),
            mis: "MIS".to_string(),
        }
    }
}

/// Alert webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Chat webhook receiving failure alerts. Alerts are dropped when unset.
    pub webhook_url: Option<String>,

    /// Timeout for a single webhook delivery, in seconds.
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.upstream.default_model, "Qwen");
        assert_eq!(cfg.upstream.timeout_secs, 30);
        assert_eq!(cfg.upstream.models.mis, "MIS");
        assert!(cfg.alert.webhook_url.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"upstream": {"base_url": "http://triton:8000/v2/models/"}}"#)
                .unwrap();
        assert_eq!(cfg.upstream.base_url(), "http://triton:8000/v2/models");
        assert_eq!(cfg.upstream.default_model, "Qwen");
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = Config::load(Path::new("/nonexistent/infer-relay.json")).unwrap();
        assert_eq!(cfg.server.index_path, PathBuf::from("index.html"));
    }

    #[test]
    fn test_cli_listen_override() {
        let cli = Cli::parse_from(["infer-relay", "--listen", "127.0.0.1:9000"]);
        let cfg = Config::default().with_cli(&cli);
        assert_eq!(cfg.server.listen, "127.0.0.1:9000");
    }
}
