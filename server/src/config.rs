//! Relay configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_LOCK_TTL_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Outbound frames buffered per connection before broadcasts to it are dropped.
    pub client_channel_capacity: usize,
    /// How long an object lock holds before another user may take it.
    pub lock_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
            lock_ttl: Duration::from_secs(DEFAULT_LOCK_TTL_SECS),
        }
    }
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `CLIENT_CHANNEL_CAPACITY`: default 256, must be non-zero
    /// - `LOCK_TTL_SECS`: default 600
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let capacity = parse_or(&lookup, "CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY);
        let client_channel_capacity = if capacity == 0 {
            warn!(default = DEFAULT_CLIENT_CHANNEL_CAPACITY, "config: CLIENT_CHANNEL_CAPACITY must be non-zero");
            DEFAULT_CLIENT_CHANNEL_CAPACITY
        } else {
            capacity
        };
        Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            client_channel_capacity,
            lock_ttl: Duration::from_secs(parse_or(&lookup, "LOCK_TTL_SECS", DEFAULT_LOCK_TTL_SECS)),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, %default, "config: unparseable value, using default");
            default
        }
    }
}
