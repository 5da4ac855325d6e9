//! Model — LogsConfig and related structs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stream::keepalive::DEFAULT_KEEP_ALIVE_INTERVAL;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// WebSocket endpoint of the log aggregator, e.g. `wss://doppler.example.com:443`.
    pub logging_endpoint: String,
    /// Controller base URL used for instance file reads.
    pub controller_url: String,
    /// Disable certificate validation entirely (self-signed deployments only).
    pub trust_self_signed_certs: bool,
    pub access_token: Option<String>,
    pub proxy_user: Option<String>,
    pub connect_timeout_ms: u64,
    pub keep_alive_interval_ms: u64,
    pub read_timeout_ms: u64,
    /// Read timeout while long-polling staging output.
    pub tail_read_timeout_ms: u64,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            logging_endpoint: "wss://doppler.localhost:443".to_string(),
            controller_url: "https://api.localhost".to_string(),
            trust_self_signed_certs: false,
            access_token: None,
            proxy_user: None,
            connect_timeout_ms: 5_000,
            keep_alive_interval_ms: DEFAULT_KEEP_ALIVE_INTERVAL.as_millis() as u64,
            read_timeout_ms: 30_000,
            tail_read_timeout_ms: 300_000,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "cf_logs=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LogsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn tail_read_timeout(&self) -> Duration {
        Duration::from_millis(self.tail_read_timeout_ms)
    }

    /// HTTP base of the log aggregator, for the multipart recent-logs call.
    pub fn logging_http_endpoint(&self) -> String {
        let endpoint = self.logging_endpoint.trim_end_matches('/');
        if let Some(rest) = endpoint.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = endpoint.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            endpoint.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LogsConfig Defaults ──────────────────────────────────────

    #[test]
    fn test_logs_config_default_endpoints() {
        let cfg = LogsConfig::default();
        assert_eq!(cfg.logging_endpoint, "wss://doppler.localhost:443");
        assert_eq!(cfg.controller_url, "https://api.localhost");
        assert!(!cfg.trust_self_signed_certs);
    }

    #[test]
    fn test_logs_config_default_timeouts() {
        let cfg = LogsConfig::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.keep_alive_interval(), Duration::from_millis(25_000));
        assert_eq!(cfg.keep_alive_interval(), DEFAULT_KEEP_ALIVE_INTERVAL);
        assert_eq!(cfg.read_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.tail_read_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_logs_config_default_no_credentials() {
        let cfg = LogsConfig::default();
        assert!(cfg.access_token.is_none());
        assert!(cfg.proxy_user.is_none());
    }

    #[test]
    fn test_logging_config_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "cf_logs=info");
        assert_eq!(logging.format, LogFormat::Pretty);
    }

    // ── Derived endpoints ────────────────────────────────────────

    #[test]
    fn test_logging_http_endpoint() {
        let mut cfg = LogsConfig::default();
        assert_eq!(cfg.logging_http_endpoint(), "https://doppler.localhost:443");

        cfg.logging_endpoint = "ws://loggregator:8080/".to_string();
        assert_eq!(cfg.logging_http_endpoint(), "http://loggregator:8080");
    }

    // ── Serialization Round-trip ─────────────────────────────────

    #[test]
    fn test_logs_config_toml_round_trip() {
        let cfg = LogsConfig::default();
        let toml_str = toml::to_string(&cfg).expect("Should serialize to TOML");
        let deserialized: LogsConfig = toml::from_str(&toml_str).expect("Should deserialize from TOML");
        assert_eq!(deserialized.logging_endpoint, cfg.logging_endpoint);
        assert_eq!(deserialized.keep_alive_interval_ms, cfg.keep_alive_interval_ms);
        assert_eq!(deserialized.logging.format, cfg.logging.format);
    }

    #[test]
    fn test_logs_config_deserialize_partial_toml() {
        let toml_str = r#"
            logging_endpoint = "wss://doppler.example.com:4443"
            trust_self_signed_certs = true

            [logging]
            format = "json"
        "#;
        let cfg: LogsConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.logging_endpoint, "wss://doppler.example.com:4443");
        assert!(cfg.trust_self_signed_certs);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "cf_logs=info"); // default
        assert_eq!(cfg.read_timeout_ms, 30_000); // default
    }
}
