//! Server configuration loaded from the environment

use std::time::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";
const DEFAULT_BACKEND_API_URL: &str = "http://localhost:8080";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_NOTIFICATION_POLL_SECS: u64 = 30;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("BACKEND_API_URL must start with http:// or https://, got '{0}'")]
    InvalidBackendUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Base URL of the data backend, without trailing slash
    pub backend_api_url: String,
    /// When set, session tokens are signature-checked locally
    pub jwt_secret: Option<String>,
    /// When set, mutating backend calls carry `X-Payload-Signature`
    pub payload_signature_secret: Option<String>,
    pub notification_poll_interval: Duration,
    pub backend_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_api_url = std::env::var("BACKEND_API_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !backend_api_url.starts_with("http://") && !backend_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidBackendUrl(backend_api_url));
        }

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            backend_api_url,
            jwt_secret: non_empty_var("JWT_SECRET"),
            payload_signature_secret: non_empty_var("PAYLOAD_SIGNATURE_SECRET"),
            notification_poll_interval: Duration::from_secs(seconds_var(
                "NOTIFICATION_POLL_SECS",
                DEFAULT_NOTIFICATION_POLL_SECS,
            )?),
            backend_timeout: Duration::from_secs(seconds_var(
                "BACKEND_TIMEOUT_SECS",
                DEFAULT_BACKEND_TIMEOUT_SECS,
            )?),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// Configuration pointing at a given backend, used by tests
    pub fn for_backend(backend_api_url: impl Into<String>) -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            backend_api_url: backend_api_url.into(),
            jwt_secret: None,
            payload_signature_secret: None,
            notification_poll_interval: Duration::from_secs(DEFAULT_NOTIFICATION_POLL_SECS),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            allowed_origins: vec![],
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn seconds_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidNumber { name, value }),
        },
    }
}
