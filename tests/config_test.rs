//! Tests for environment-driven configuration loading.

use std::time::Duration;

use instagram_discord_notifier::config::{Config, ConfigError, StoreBackend};
use serial_test::serial;

const ALL_VARS: &[&str] = &[
    "GRAPH_API_BASE_URL",
    "ACCESS_TOKEN",
    "DISCORD_WEBHOOK_URL",
    "STORE_BACKEND",
    "STATE_FILE_PATH",
    "DATABASE_PATH",
    "POLL_INTERVAL_MINS",
    "POLL_JITTER_SECS",
    "CYCLE_COOLDOWN_SECS",
    "WEB_HOST",
    "WEB_PORT",
];

fn clear_env() {
    for name in ALL_VARS {
        std::env::remove_var(name);
    }
}

fn set_required() {
    std::env::set_var("ACCESS_TOKEN", "token");
    std::env::set_var(
        "DISCORD_WEBHOOK_URL",
        "https://discord.com/api/webhooks/1/abc",
    );
}

#[test]
#[serial]
fn test_from_env_requires_access_token() {
    clear_env();
    std::env::set_var(
        "DISCORD_WEBHOOK_URL",
        "https://discord.com/api/webhooks/1/abc",
    );

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "ACCESS_TOKEN"));
}

#[test]
#[serial]
fn test_from_env_requires_webhook_url() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "token");

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "DISCORD_WEBHOOK_URL"));
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    set_required();

    let config = Config::from_env().unwrap();
    assert_eq!(config.store_backend, StoreBackend::File);
    assert_eq!(config.api_base_url, "https://graph.instagram.com");
    assert_eq!(config.poll_interval, Duration::from_secs(600));
    assert_eq!(config.poll_jitter, Duration::from_secs(30));
    assert_eq!(config.web_port, 8080);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_sqlite_backend_and_interval() {
    clear_env();
    set_required();
    std::env::set_var("STORE_BACKEND", "sqlite");
    std::env::set_var("POLL_INTERVAL_MINS", "5");

    let config = Config::from_env().unwrap();
    assert_eq!(config.store_backend, StoreBackend::Sqlite);
    assert_eq!(config.poll_interval, Duration::from_secs(300));
}

#[test]
#[serial]
fn test_from_env_rejects_non_numeric_interval() {
    clear_env();
    set_required();
    std::env::set_var("POLL_INTERVAL_MINS", "ten");

    assert!(matches!(
        Config::from_env().unwrap_err(),
        ConfigError::ParseInt { .. }
    ));
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_backend() {
    clear_env();
    set_required();
    std::env::set_var("STORE_BACKEND", "mongo");

    assert!(matches!(
        Config::from_env().unwrap_err(),
        ConfigError::InvalidValue { .. }
    ));
}
