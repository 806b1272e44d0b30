//! Configuration management.

use anyhow::bail;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the media server's HTTP API.
pub const DEFAULT_MEDIA_SERVER_URL: &str = "http://127.0.0.1:1985";

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    media_server: MediaServerConfig,
    #[serde(default)]
    realtime: RealtimeConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MediaServerConfig {
    #[serde(default = "default_media_server_url")]
    api_url: String,
    /// Upper bound for one status query, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
}

impl Default for MediaServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_media_server_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RealtimeConfig {
    /// Seconds between liveness sweeps of open sockets
    #[serde(default = "default_ping_interval_secs")]
    ping_interval_secs: u64,
    /// Frames queued per socket before it counts as stuck
    #[serde(default = "default_send_buffer")]
    send_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            send_buffer: default_send_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_port() -> u16 {
    restream_types::DEFAULT_PORT
}

fn default_media_server_url() -> String {
    DEFAULT_MEDIA_SERVER_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_send_buffer() -> usize {
    256
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins (empty allows any origin)
    pub cors_allowed_origins: Vec<String>,
    /// Base URL of the media server's HTTP API
    pub media_server_url: String,
    /// Timeout for one media server status query
    pub media_server_timeout: Duration,
    /// Interval between socket liveness sweeps
    pub ping_interval: Duration,
    /// Outbound frame queue depth per socket
    pub send_buffer: usize,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/restream/ on Linux)
    /// 2. `.restream.toml` in current directory
    ///
    /// Environment variables use the `RESTREAM_` prefix with `__` between
    /// section and key, e.g. `RESTREAM_SERVER__PORT`.
    pub fn from_figment(port: Option<u16>, media_server_url: Option<String>) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".restream.toml"));
        let user_config = directories::ProjectDirs::from("", "", "restream")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Build figment with priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        for path in [user_config, local_config].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("RESTREAM_").split("__"));

        if let Some(p) = port {
            figment = figment.merge(Serialized::default("server.port", p));
        }
        if let Some(ref url) = media_server_url {
            figment = figment.merge(Serialized::default("media_server.api_url", url));
        }

        let config_file: ConfigFile = figment.extract()?;
        Self::from_file(config_file)
    }

    /// Load configuration from a single TOML file, ignoring the environment.
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_file: ConfigFile = Figment::new()
            .merge(Serialized::defaults(ConfigFile::default()))
            .merge(Toml::file(path.as_ref()))
            .extract()?;
        Self::from_file(config_file)
    }

    fn from_file(file: ConfigFile) -> anyhow::Result<Self> {
        if file.realtime.ping_interval_secs == 0 {
            bail!("realtime.ping_interval_secs must be greater than zero");
        }
        if file.realtime.send_buffer == 0 {
            bail!("realtime.send_buffer must be greater than zero");
        }
        if file.media_server.request_timeout_ms == 0 {
            bail!("media_server.request_timeout_ms must be greater than zero");
        }

        Ok(Self {
            port: file.server.port,
            cors_allowed_origins: file.server.cors_allowed_origins,
            media_server_url: file.media_server.api_url.trim_end_matches('/').to_string(),
            media_server_timeout: Duration::from_millis(file.media_server.request_timeout_ms),
            ping_interval: Duration::from_secs(file.realtime.ping_interval_secs),
            send_buffer: file.realtime.send_buffer,
            log_file: file.logging.log_file,
            log_level: file.logging.log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: Vec::new(),
            media_server_url: default_media_server_url(),
            media_server_timeout: Duration::from_millis(default_request_timeout_ms()),
            ping_interval: Duration::from_secs(default_ping_interval_secs()),
            send_buffer: default_send_buffer(),
            log_file: None,
            log_level: None,
        }
    }
}
