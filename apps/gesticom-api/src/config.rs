//! # Service Configuration
//!
//! Loaded once at startup from `GESTICOM_*` environment variables.
//! Every variable is optional; unset ones fall back to the defaults below.
//!
//! | Variable | Default |
//! |---|---|
//! | `GESTICOM_BIND_ADDR` | `0.0.0.0:3001` |
//! | `GESTICOM_DB_PATH` | `./gesticom.db` |
//! | `GESTICOM_DB_MAX_CONNECTIONS` | `5` |
//! | `GESTICOM_COMMIT_TIMEOUT_MS` | `5000` |
//! | `GESTICOM_STORE_NAME` | `GESTICOM` |
//! | `GESTICOM_LOW_STOCK_LIMIT` | `5` |
//!
//! Configuration is read-only after startup and shared behind an `Arc`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gesticom_core::DEFAULT_LOW_STOCK_LIMIT;
use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "GESTICOM_BIND_ADDR";
pub const DB_PATH_VAR: &str = "GESTICOM_DB_PATH";
pub const DB_MAX_CONNECTIONS_VAR: &str = "GESTICOM_DB_MAX_CONNECTIONS";
pub const COMMIT_TIMEOUT_VAR: &str = "GESTICOM_COMMIT_TIMEOUT_MS";
pub const STORE_NAME_VAR: &str = "GESTICOM_STORE_NAME";
pub const LOW_STOCK_LIMIT_VAR: &str = "GESTICOM_LOW_STOCK_LIMIT";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration of the HTTP service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub db_max_connections: u32,
    /// Upper bound for one sale, void or delete to commit.
    pub commit_timeout: Duration,
    /// Printed on receipts.
    pub store_name: String,
    /// Default threshold for the low stock listing.
    pub low_stock_limit: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            db_path: PathBuf::from("./gesticom.db"),
            db_max_connections: 5,
            commit_timeout: Duration::from_millis(5000),
            store_name: "GESTICOM".to_string(),
            low_stock_limit: DEFAULT_LOW_STOCK_LIMIT,
        }
    }
}

impl ApiConfig {
    /// Reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let bind_addr = parse_var(&lookup, BIND_ADDR_VAR)?.unwrap_or(defaults.bind_addr);
        let db_path = lookup(DB_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let db_max_connections: u32 =
            parse_var(&lookup, DB_MAX_CONNECTIONS_VAR)?.unwrap_or(defaults.db_max_connections);
        let commit_timeout_ms: u64 = parse_var(&lookup, COMMIT_TIMEOUT_VAR)?
            .unwrap_or(defaults.commit_timeout.as_millis() as u64);
        let store_name = lookup(STORE_NAME_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.store_name);
        let low_stock_limit: i64 =
            parse_var(&lookup, LOW_STOCK_LIMIT_VAR)?.unwrap_or(defaults.low_stock_limit);

        if db_max_connections == 0 {
            return Err(invalid(DB_MAX_CONNECTIONS_VAR, "0", "must be at least 1"));
        }
        if commit_timeout_ms == 0 {
            return Err(invalid(COMMIT_TIMEOUT_VAR, "0", "must be at least 1"));
        }
        if low_stock_limit < 0 {
            return Err(invalid(
                LOW_STOCK_LIMIT_VAR,
                &low_stock_limit.to_string(),
                "must not be negative",
            ));
        }

        Ok(ApiConfig {
            bind_addr,
            db_path,
            db_max_connections,
            commit_timeout: Duration::from_millis(commit_timeout_ms),
            store_name,
            low_stock_limit,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(var, &raw, &e.to_string())),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.db_path, PathBuf::from("./gesticom.db"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.commit_timeout, Duration::from_secs(5));
        assert_eq!(config.store_name, "GESTICOM");
        assert_eq!(config.low_stock_limit, 5);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "127.0.0.1:8080"),
            (DB_PATH_VAR, "/tmp/shop.db"),
            (COMMIT_TIMEOUT_VAR, "250"),
            (STORE_NAME_VAR, "  Almacén Don Pepe "),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.db_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.commit_timeout, Duration::from_millis(250));
        assert_eq!(config.store_name, "Almacén Don Pepe");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[(DB_MAX_CONNECTIONS_VAR, "many")])).unwrap_err();
        assert!(err.to_string().contains(DB_MAX_CONNECTIONS_VAR));

        assert!(ApiConfig::from_lookup(lookup(&[(COMMIT_TIMEOUT_VAR, "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(LOW_STOCK_LIMIT_VAR, "-1")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(BIND_ADDR_VAR, "nowhere")])).is_err());
    }
}
