//! Boot — config load, logging init, credentials.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{Anonymous, SharedCredentials, StaticToken};
use crate::conf::{LogFormat, LoggingConfig, LogsConfig};
use crate::error::Result;

/// Initialise the tracing / logging subsystem. Output goes to stderr so
/// stdout carries only log entries.
pub fn init_logging(logging: &LoggingConfig) {
    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// Load configuration, either from `config_path` or the default
/// file/environment lookup.
pub fn load_config(config_path: Option<&Path>) -> Result<LogsConfig> {
    match config_path {
        Some(path) => {
            let mut config = LogsConfig::from_file(path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => LogsConfig::load(),
    }
}

/// Credentials from configuration: a static token when one is set.
pub fn credentials(config: &LogsConfig) -> SharedCredentials {
    match &config.access_token {
        Some(token) => {
            let mut creds = StaticToken::new(token);
            if let Some(user) = &config.proxy_user {
                creds = creds.with_proxy_user(user.clone());
            }
            Arc::new(creds)
        }
        None => Arc::new(Anonymous),
    }
}

/// Load config and start logging.
pub fn boot(config_path: Option<&Path>) -> Result<LogsConfig> {
    let config = load_config(config_path)?;
    init_logging(&config.logging);

    info!("Starting cf-logs v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Loaded configuration: logging_endpoint={}, controller_url={}",
        config.logging_endpoint, config.controller_url
    );
    info!(
        "Timeouts: connect={}ms, keep_alive={}ms, read={}ms, tail_read={}ms",
        config.connect_timeout_ms,
        config.keep_alive_interval_ms,
        config.read_timeout_ms,
        config.tail_read_timeout_ms
    );
    Ok(config)
}
