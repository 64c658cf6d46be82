//! Runtime settings for browsing sessions.
//!
//! ```
//! use hallplan_server::config::ServerConfig;
//!
//! let config = ServerConfig::from_json(r#"{"maxConcurrentFetches": 4}"#).unwrap();
//! assert_eq!(config.max_concurrent_fetches, 4);
//! assert_eq!(config.occupant_fetch_timeout_ms, 5000);
//! assert!(config.validate().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Occupant fetches allowed in flight at once.
    pub max_concurrent_fetches: usize,
    /// Per-room occupant fetch budget; a timeout counts as a failed fetch.
    pub occupant_fetch_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            occupant_fetch_timeout_ms: 5000,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroConcurrency,
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroConcurrency => write!(f, "maxConcurrentFetches must be at least 1"),
            ConfigError::ZeroTimeout => write!(f, "occupantFetchTimeoutMs must be at least 1"),
        }
    }
}

impl ServerConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_concurrent_fetches == 0 {
            errors.push(ConfigError::ZeroConcurrency);
        }
        if self.occupant_fetch_timeout_ms == 0 {
            errors.push(ConfigError::ZeroTimeout);
        }
        errors
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.occupant_fetch_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ServerConfig::default().validate().is_empty());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(ServerConfig::from_json("{}").unwrap(), ServerConfig::default());
    }

    #[test]
    fn zero_values_rejected() {
        let config = ServerConfig::from_json(
            r#"{"maxConcurrentFetches": 0, "occupantFetchTimeoutMs": 0}"#,
        )
        .unwrap();
        assert_eq!(
            config.validate(),
            vec![ConfigError::ZeroConcurrency, ConfigError::ZeroTimeout]
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ServerConfig::from_json(r#"{"maxConcurrentFetches": "many"}"#).is_err());
    }
}
