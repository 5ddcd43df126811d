//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if a variable is set but unparsable.
//! Every value has a default, so an empty environment is a valid config.

use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP front-end binds to.
    pub bind: SocketAddr,
    /// Number of long-lived workers pulling from the queue.
    pub workers: usize,
    /// Maximum time a dispatcher waits for its result.
    pub request_timeout: Duration,
    /// Expiry applied to published results. `None` keeps them until consumed.
    pub result_ttl: Option<Duration>,
    /// How often the reaper sweeps expired results.
    pub reaper_interval: Duration,
    /// Maximum queued items. 0 means unbounded.
    pub queue_capacity: usize,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            workers: 2,
            request_timeout: Duration::from_secs(30),
            result_ttl: Some(Duration::from_secs(300)),
            reaper_interval: Duration::from_secs(30),
            queue_capacity: 1024,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let workers = parsed(&lookup, "MULEPOOL_WORKERS")?.unwrap_or(defaults.workers);
        if workers == 0 {
            return Err(Error::Config(
                "MULEPOOL_WORKERS must be at least 1".to_string(),
            ));
        }

        let result_ttl = match parsed::<u64, _>(&lookup, "MULEPOOL_RESULT_TTL_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.result_ttl,
        };

        let reaper_interval = parsed(&lookup, "MULEPOOL_REAPER_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.reaper_interval);
        if reaper_interval.is_zero() {
            return Err(Error::Config(
                "MULEPOOL_REAPER_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind: parsed(&lookup, "MULEPOOL_BIND")?.unwrap_or(defaults.bind),
            workers,
            request_timeout: parsed(&lookup, "MULEPOOL_REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            result_ttl,
            reaper_interval,
            queue_capacity: parsed(&lookup, "MULEPOOL_QUEUE_CAPACITY")?
                .unwrap_or(defaults.queue_capacity),
            otel_endpoint: lookup("OTEL_ENDPOINT").filter(|s| !s.is_empty()),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid value for {name} ({raw:?}): {e}"))),
        None => Ok(None),
    }
}
