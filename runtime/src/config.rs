//! Service configuration sourced from the process environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

/// Default dispatcher admission limit.
pub const DEFAULT_WORKER_LIMIT: usize = 2;

/// Default bind address for the Prometheus exporter.
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";

/// Default destination for command events.
pub const DEFAULT_EVENT_OUTPUT: &str = "stdout";

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    /// A variable is present but does not parse.
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Runtime configuration for the pickup-point service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Postgres connection URL.
    pub database_url: String,
    /// Time-to-live for cached order records.
    pub cache_ttl: Duration,
    /// Dispatcher admission limit.
    pub worker_limit: usize,
    /// Bind address for the Prometheus exporter.
    pub metrics_addr: SocketAddr,
    /// Destination for command events: `stdout`, `tracing`, or a file
    /// path. Resolved into a sink by [`crate::sink::sink_for`].
    pub event_output: String,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// `DATABASE_URL` and `CACHE_TTL_SECONDS` are required; `WORKER_LIMIT`,
    /// `METRICS_ADDR` and `EVENT_OUTPUT` fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injected variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let ttl_raw = lookup("CACHE_TTL_SECONDS").ok_or(ConfigError::Missing("CACHE_TTL_SECONDS"))?;
        let ttl_seconds: i64 = ttl_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "CACHE_TTL_SECONDS",
            value: ttl_raw.clone(),
        })?;
        if ttl_seconds <= 0 {
            return Err(ConfigError::Invalid {
                name: "CACHE_TTL_SECONDS",
                value: ttl_raw,
            });
        }

        let worker_limit = match lookup("WORKER_LIMIT") {
            Some(raw) => {
                let parsed: usize = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "WORKER_LIMIT",
                    value: raw.clone(),
                })?;
                if parsed == 0 {
                    return Err(ConfigError::Invalid {
                        name: "WORKER_LIMIT",
                        value: raw,
                    });
                }
                parsed
            }
            None => DEFAULT_WORKER_LIMIT,
        };

        let addr_raw = lookup("METRICS_ADDR").unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "METRICS_ADDR",
            value: addr_raw,
        })?;

        let event_output =
            lookup("EVENT_OUTPUT").unwrap_or_else(|| DEFAULT_EVENT_OUTPUT.to_string());

        Ok(Self {
            database_url,
            cache_ttl: Duration::seconds(ttl_seconds),
            worker_limit,
            metrics_addr,
            event_output,
        })
    }
}
