//! Connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use recall_core::{Error, Result};

/// Pool sizing and acquire timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a query waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Read overrides from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DB_MAX_CONNECTIONS` | 10 |
    /// | `DB_CONNECT_TIMEOUT_SECS` | 30 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            acquire_timeout: lookup("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(&self, database_url: &str) -> Result<PgPool> {
        let start = Instant::now();
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "pool",
            op = "connect",
            max_connections = self.max_connections,
            pool_size = pool.size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Database connection pool established"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let config = PoolConfig::from_lookup(|key| match key {
            "DB_MAX_CONNECTIONS" => Some("25".into()),
            "DB_CONNECT_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        });
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = PoolConfig::from_lookup(|key| match key {
            "DB_MAX_CONNECTIONS" => Some("0".into()),
            "DB_CONNECT_TIMEOUT_SECS" => Some("soon".into()),
            _ => None,
        });
        assert_eq!(config, PoolConfig::default());
    }
}
