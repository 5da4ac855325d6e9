//! Load — config loading from file and environment variables.

use std::path::Path;
use std::str::FromStr;

use super::model::LogsConfig;
use crate::error::{LogError, Result};

const CONFIG_FILE_ENV: &str = "CF_LOGS_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "/etc/cf-logs/cf-logs.toml";

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl LogsConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LogError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| LogError::Config(format!("invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Environment variables override file config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("CF_LOGS_LOGGING_ENDPOINT") {
            self.logging_endpoint = endpoint;
        }
        if let Ok(url) = std::env::var("CF_LOGS_CONTROLLER_URL") {
            self.controller_url = url;
        }
        if let Some(skip) = env_parse("CF_LOGS_SKIP_SSL_VALIDATION") {
            self.trust_self_signed_certs = skip;
        }
        if let Ok(token) = std::env::var("CF_LOGS_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Ok(user) = std::env::var("CF_LOGS_PROXY_USER") {
            self.proxy_user = Some(user);
        }
        if let Some(ms) = env_parse("CF_LOGS_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("CF_LOGS_KEEP_ALIVE_MS") {
            self.keep_alive_interval_ms = ms;
        }
        if let Some(ms) = env_parse("CF_LOGS_READ_TIMEOUT_MS") {
            self.read_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("CF_LOGS_TAIL_READ_TIMEOUT_MS") {
            self.tail_read_timeout_ms = ms;
        }
    }

    /// Validate that endpoints and durations are sane
    pub fn validate(&self) -> Result<()> {
        if self.logging_endpoint.is_empty() {
            return Err(LogError::Config("logging_endpoint must not be empty".to_string()));
        }
        if !(self.logging_endpoint.starts_with("ws://") || self.logging_endpoint.starts_with("wss://")) {
            return Err(LogError::Config(format!(
                "logging_endpoint must be a ws:// or wss:// URL, got {}",
                self.logging_endpoint
            )));
        }
        if self.controller_url.is_empty() {
            return Err(LogError::Config("controller_url must not be empty".to_string()));
        }
        if !(self.controller_url.starts_with("http://") || self.controller_url.starts_with("https://")) {
            return Err(LogError::Config(format!(
                "controller_url must be an http:// or https:// URL, got {}",
                self.controller_url
            )));
        }
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("keep_alive_interval_ms", self.keep_alive_interval_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("tail_read_timeout_ms", self.tail_read_timeout_ms),
        ] {
            if value == 0 {
                return Err(LogError::Config(format!("{} must be > 0", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_err(cfg: &LogsConfig) -> String {
        match cfg.validate() {
            Err(LogError::Config(msg)) => msg,
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_default_passes() {
        assert!(LogsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_logging_endpoint() {
        let cfg = LogsConfig {
            logging_endpoint: String::new(),
            ..Default::default()
        };
        assert!(config_err(&cfg).contains("logging_endpoint"));
    }

    #[test]
    fn test_validate_rejects_http_logging_endpoint() {
        let cfg = LogsConfig {
            logging_endpoint: "https://doppler.example.com".to_string(),
            ..Default::default()
        };
        assert!(config_err(&cfg).contains("ws://"));
    }

    #[test]
    fn test_validate_rejects_non_http_controller() {
        let cfg = LogsConfig {
            controller_url: "ftp://api.example.com".to_string(),
            ..Default::default()
        };
        assert!(config_err(&cfg).contains("controller_url"));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let cfg = LogsConfig {
            keep_alive_interval_ms: 0,
            ..Default::default()
        };
        assert!(config_err(&cfg).contains("keep_alive_interval_ms"));

        let cfg = LogsConfig {
            tail_read_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config_err(&cfg).contains("tail_read_timeout_ms"));
    }

    #[test]
    fn test_from_file_reads_toml() {
        let path = std::env::temp_dir().join(format!("cf-logs-test-{}.toml", std::process::id()));
        std::fs::write(&path, "controller_url = \"https://api.example.com\"\nread_timeout_ms = 1234\n").unwrap();

        let cfg = LogsConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.controller_url, "https://api.example.com");
        assert_eq!(cfg.read_timeout_ms, 1234);
        assert_eq!(cfg.connect_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_file_missing_is_config_error() {
        let err = LogsConfig::from_file("/nonexistent/cf-logs.toml").unwrap_err();
        assert!(matches!(err, LogError::Config(_)));
    }

    #[test]
    fn test_from_file_invalid_toml_is_config_error() {
        let path = std::env::temp_dir().join(format!("cf-logs-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "read_timeout_ms = \"soon\"").unwrap();

        let err = LogsConfig::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, LogError::Config(_)));
    }
}
