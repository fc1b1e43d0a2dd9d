//! Environment-driven configuration.
//!
//! Every setting is optional. Database settings use the same variable
//! names as the other benchmark implementations (`PGDB`, `PGUSER`, `PGPASS`,
//! `PGHOST`), service settings are prefixed `WORLDBENCH_`. A `.env` file in
//! the working directory is honoured by the binary before this runs.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgSslMode;

use crate::error::{Error, Result};

/// Connection settings for the Postgres pool.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "benchmark_db".to_owned(),
            user: "postgres".to_owned(),
            password: "root".to_owned(),
            host: "localhost".to_owned(),
            port: 5432,
            ssl_mode: PgSslMode::Require,
            max_connections: 64,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the HTTP side and the request operations.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    /// Value of the `Server` header stamped on every response.
    pub server_name: String,
    /// How long a connection may take to send request headers.
    pub read_timeout: Duration,
    /// Process-wide cap on concurrent `/dbs` fetches. `None` = unbounded.
    pub db_concurrency: Option<usize>,
    /// Surface a missing row as 404 instead of a zero-valued row.
    pub strict_not_found: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            server_name: "worldbench".to_owned(),
            read_timeout: Duration::from_secs(100_000),
            db_concurrency: None,
            strict_not_found: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub service: ServiceConfig,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset or empty values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut database = DatabaseConfig::default();
        if let Some(v) = get("PGDB") {
            database.name = v;
        }
        if let Some(v) = get("PGUSER") {
            database.user = v;
        }
        if let Some(v) = get("PGPASS") {
            database.password = v;
        }
        if let Some(v) = get("PGHOST") {
            database.host = v;
        }
        if let Some(v) = get("PGPORT") {
            database.port = parse("PGPORT", &v)?;
        }
        if let Some(v) = get("PGSSLMODE") {
            database.ssl_mode = parse("PGSSLMODE", &v)?;
        }
        if let Some(v) = get("WORLDBENCH_MAX_CONNECTIONS") {
            database.max_connections = parse("WORLDBENCH_MAX_CONNECTIONS", &v)?;
            if database.max_connections == 0 {
                return Err(invalid("WORLDBENCH_MAX_CONNECTIONS", "must be at least 1"));
            }
        }
        if let Some(v) = get("WORLDBENCH_ACQUIRE_TIMEOUT_SECS") {
            database.acquire_timeout =
                Duration::from_secs(parse("WORLDBENCH_ACQUIRE_TIMEOUT_SECS", &v)?);
        }

        let mut service = ServiceConfig::default();
        if let Some(v) = get("WORLDBENCH_ADDR") {
            service.addr = parse("WORLDBENCH_ADDR", &v)?;
        }
        if let Some(v) = get("WORLDBENCH_SERVER_NAME") {
            service.server_name = v;
        }
        if let Some(v) = get("WORLDBENCH_READ_TIMEOUT_SECS") {
            service.read_timeout = Duration::from_secs(parse("WORLDBENCH_READ_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("WORLDBENCH_DB_CONCURRENCY") {
            let limit: usize = parse("WORLDBENCH_DB_CONCURRENCY", &v)?;
            if limit == 0 {
                return Err(invalid("WORLDBENCH_DB_CONCURRENCY", "must be at least 1"));
            }
            service.db_concurrency = Some(limit);
        }
        if let Some(v) = get("WORLDBENCH_STRICT_NOT_FOUND") {
            service.strict_not_found = parse_flag("WORLDBENCH_STRICT_NOT_FOUND", &v)?;
        }

        Ok(Self { database, service })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| invalid(var, e.to_string()))
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(var, format!("expected a boolean, got `{other}`"))),
    }
}

fn invalid(var: &'static str, message: impl Into<String>) -> Error {
    Error::Config { var, message: message.into() }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_benchmark_fixture() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database.name, "benchmark_db");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.database.password, "root");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert!(matches!(config.database.ssl_mode, PgSslMode::Require));
        assert_eq!(config.service.addr.port(), 8080);
        assert_eq!(config.service.db_concurrency, None);
        assert!(!config.service.strict_not_found);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(&[
            ("PGDB", "worlds"),
            ("PGHOST", "db.internal"),
            ("PGSSLMODE", "disable"),
            ("WORLDBENCH_ADDR", "127.0.0.1:9000"),
            ("WORLDBENCH_DB_CONCURRENCY", "32"),
            ("WORLDBENCH_STRICT_NOT_FOUND", "true"),
        ])
        .unwrap();
        assert_eq!(config.database.name, "worlds");
        assert_eq!(config.database.host, "db.internal");
        assert!(matches!(config.database.ssl_mode, PgSslMode::Disable));
        assert_eq!(config.service.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.service.db_concurrency, Some(32));
        assert!(config.service.strict_not_found);
    }

    #[test]
    fn empty_values_keep_defaults() {
        let config = config(&[("PGUSER", ""), ("PGPORT", "  ")]).unwrap();
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config(&[("PGPORT", "fifty")]).unwrap_err();
        assert!(matches!(err, Error::Config { var: "PGPORT", .. }));

        let err = config(&[("WORLDBENCH_DB_CONCURRENCY", "0")]).unwrap_err();
        assert!(matches!(err, Error::Config { var: "WORLDBENCH_DB_CONCURRENCY", .. }));

        let err = config(&[("WORLDBENCH_STRICT_NOT_FOUND", "maybe")]).unwrap_err();
        assert!(matches!(err, Error::Config { var: "WORLDBENCH_STRICT_NOT_FOUND", .. }));
    }
}
