use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CACHE_CAPACITY, DEFAULT_OTEL_ENDPOINT,
    DEFAULT_REAP_INTERVAL_SECS, DEFAULT_SERVICE_NAME, DEFAULT_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub database: Database,
    pub listener: Option<Listener>,
    pub session: Option<SessionSettings>,
    pub tracing: Option<Tracing>,
}

impl Configuration {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".to_string()));
        }
        if let Some(session) = &self.session {
            if session.cache_capacity == Some(0) {
                return Err(ConfigError::Invalid(
                    "session.cache_capacity must be at least 1".to_string(),
                ));
            }
            if session.ttl().is_zero() {
                return Err(ConfigError::Invalid("session.ttl must be positive".to_string()));
            }
            if session.ttl() > Duration::from_secs(MAX_SESSION_TTL_SECS) {
                return Err(ConfigError::Invalid(format!(
                    "session.ttl must not exceed {} seconds",
                    MAX_SESSION_TTL_SECS
                )));
            }
            if session.reap_interval().is_zero() {
                return Err(ConfigError::Invalid(
                    "session.reap_interval must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> &str {
        self.listener
            .as_ref()
            .map(|l| l.address.as_str())
            .unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn session_settings(&self) -> SessionSettings {
        self.session.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listener {
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    pub cache_capacity: Option<usize>,
    pub ttl: Option<DurationString>,
    pub reap_interval: Option<DurationString>,
}

impl SessionSettings {
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
            .clone()
            .map(Duration::from)
            .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }

    pub fn reap_interval(&self) -> Duration {
        self.reap_interval
            .clone()
            .map(Duration::from)
            .unwrap_or(Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tracing {
    #[serde(default)]
    pub enabled: bool,
    pub otel_endpoint: Option<String>,
    pub service_name: Option<String>,
}

impl Tracing {
    pub fn otel_endpoint(&self) -> &str {
        self.otel_endpoint.as_deref().unwrap_or(DEFAULT_OTEL_ENDPOINT)
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }
}
