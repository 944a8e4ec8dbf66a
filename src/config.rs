use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Instagram Graph API
    pub api_base_url: String,
    pub access_token: String,

    // Discord webhook
    pub webhook_url: String,

    // Durable last-seen state
    pub store_backend: StoreBackend,
    pub state_file_path: PathBuf,
    pub database_path: PathBuf,

    // Scheduling
    pub poll_interval: Duration,
    pub poll_jitter: Duration,
    pub cycle_cooldown: Duration,

    // Liveness endpoint
    pub web_host: String,
    pub web_port: u16,
}

/// Which durable store holds the last notified post id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Small JSON file, for hosts with a durable working directory.
    File,
    /// SQLite database, for hosts where only a mounted data path survives.
    Sqlite,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Instagram Graph API
            api_base_url: env_or_default("GRAPH_API_BASE_URL", "https://graph.instagram.com"),
            access_token: required_env("ACCESS_TOKEN")?,

            // Discord webhook
            webhook_url: required_env("DISCORD_WEBHOOK_URL")?,

            // Durable last-seen state
            store_backend: parse_store_backend(&env_or_default("STORE_BACKEND", "file"))?,
            state_file_path: PathBuf::from(env_or_default(
                "STATE_FILE_PATH",
                "./data/last_post.json",
            )),
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/notifier.sqlite")),

            // Scheduling
            poll_interval: Duration::from_secs(parse_env_u64("POLL_INTERVAL_MINS", 10)? * 60),
            poll_jitter: Duration::from_secs(parse_env_u64("POLL_JITTER_SECS", 30)?),
            cycle_cooldown: Duration::from_secs(parse_env_u64("CYCLE_COOLDOWN_SECS", 5)?),

            // Liveness endpoint
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "ACCESS_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if Url::parse(&self.webhook_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "DISCORD_WEBHOOK_URL".to_string(),
                message: "must be a valid URL".to_string(),
            });
        }
        if Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "GRAPH_API_BASE_URL".to_string(),
                message: "must be a valid URL".to_string(),
            });
        }
        if self.poll_interval < Duration::from_secs(60) {
            return Err(ConfigError::InvalidValue {
                name: "POLL_INTERVAL_MINS".to_string(),
                message: "must be at least 1 minute".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for tests: local endpoints, tight timings, no jitter.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:1".to_string(),
            access_token: "test-token".to_string(),
            webhook_url: "http://127.0.0.1:1/webhook".to_string(),
            store_backend: StoreBackend::File,
            state_file_path: PathBuf::from("./last_post.json"),
            database_path: PathBuf::from("./notifier.sqlite"),
            poll_interval: Duration::from_millis(50),
            poll_jitter: Duration::ZERO,
            cycle_cooldown: Duration::from_millis(50),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_store_backend(value: &str) -> Result<StoreBackend, ConfigError> {
    match value.to_lowercase().as_str() {
        "file" => Ok(StoreBackend::File),
        "sqlite" => Ok(StoreBackend::Sqlite),
        _ => Err(ConfigError::InvalidValue {
            name: "STORE_BACKEND".to_string(),
            message: format!("must be 'file' or 'sqlite', got '{value}'"),
        }),
    }
}
