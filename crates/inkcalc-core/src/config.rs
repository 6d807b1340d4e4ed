//! Session configuration.
//!
//! Defaults match the stock web client. Hosts can override them from a
//! deserialized file or from the environment:
//!
//! - `INKCALC_API_URL`: solver base URL (`/calculate` is appended)
//! - `INKCALC_DELIVERY_DELAY_MS`: delay before each result is shown
//! - `INKCALC_REQUEST_TIMEOUT_MS`: solver request timeout (unset = none)

use kurbo::Point;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default solver base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8900";
/// Default staged delivery delay.
pub const DEFAULT_DELIVERY_DELAY_MS: u64 = 1000;
/// Where labels go when no ink was ever found.
pub const DEFAULT_ANCHOR: Point = Point::new(10.0, 200.0);

const SOLVE_ROUTE: &str = "/calculate";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Tunables for a [`SketchSession`](crate::SketchSession).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Solver base URL.
    pub api_url: String,
    /// Delay between a response arriving and each of its results appearing.
    pub delivery_delay_ms: u64,
    /// Solver request timeout. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
    /// Anchor used until a solve finds ink.
    pub default_anchor: Point,
    /// Initial surface size.
    pub width: u32,
    pub height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            delivery_delay_ms: DEFAULT_DELIVERY_DELAY_MS,
            request_timeout_ms: None,
            default_anchor: DEFAULT_ANCHOR,
            width: 800,
            height: 600,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `INKCALC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("INKCALC_API_URL") {
            config.api_url = url;
        }
        if let Some(ms) = parse_ms(&lookup, "INKCALC_DELIVERY_DELAY_MS")? {
            config.delivery_delay_ms = ms;
        }
        if let Some(ms) = parse_ms(&lookup, "INKCALC_REQUEST_TIMEOUT_MS")? {
            config.request_timeout_ms = Some(ms);
        }

        Ok(config)
    }

    /// Full solve endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), SOLVE_ROUTE)
    }

    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_ms(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<Option<u64>, ConfigError> {
    lookup(var)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.endpoint(), "http://localhost:8900/calculate");
        assert_eq!(config.delivery_delay(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.default_anchor, Point::new(10.0, 200.0));
    }

    #[test]
    fn test_from_lookup() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("INKCALC_API_URL", "https://solver.example/api/"),
            ("INKCALC_DELIVERY_DELAY_MS", "250"),
            ("INKCALC_REQUEST_TIMEOUT_MS", "30000"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint(), "https://solver.example/api/calculate");
        assert_eq!(config.delivery_delay(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_number() {
        let result = SessionConfig::from_lookup(lookup_from(&[("INKCALC_DELIVERY_DELAY_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"delivery_delay_ms": 0, "width": 1024}"#).unwrap();
        assert_eq!(config.delivery_delay(), Duration::ZERO);
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 600);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
