//! Server configuration loaded from the environment.

use recall_core::defaults;

/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default CORS origin list.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Global request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub period_secs: u64,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret required by the sweep trigger. `None` leaves it open.
    pub cron_secret: Option<String>,
    pub session_ttl: chrono::Duration,
    /// Add the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
    pub allowed_origins: Vec<String>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
    pub body_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: "postgres://localhost/recall".to_string(),
            cron_secret: None,
            session_ttl: chrono::Duration::hours(defaults::SESSION_TTL_HOURS),
            secure_cookies: false,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGINS.to_string()],
            rate_limit: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HOST` | `0.0.0.0` | Listen address |
    /// | `PORT` | `3000` | Listen port |
    /// | `DATABASE_URL` | `postgres://localhost/recall` | PostgreSQL connection string |
    /// | `CRON_SECRET` | unset | Bearer secret for `/api/reminders/process` |
    /// | `SESSION_TTL_HOURS` | `720` | Session lifetime |
    /// | `SECURE_COOKIES` | `false` | Mark the session cookie `Secure` |
    /// | `ALLOWED_ORIGINS` | `http://localhost:3000` | Comma-separated CORS origins |
    /// | `RATE_LIMIT_ENABLED` | `true` | Enable the global rate limiter |
    /// | `RATE_LIMIT_REQUESTS` | `100` | Requests per period |
    /// | `RATE_LIMIT_PERIOD_SECS` | `60` | Rate limit period |
    /// | `MAX_BODY_BYTES` | `1048576` | Request body limit |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = parse_env("PORT").unwrap_or(defaults.port);
        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let cron_secret = std::env::var("CRON_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let session_ttl = parse_env::<i64>("SESSION_TTL_HOURS")
            .filter(|h| *h > 0)
            .map(chrono::Duration::hours)
            .unwrap_or(defaults.session_ttl);
        let secure_cookies = env_flag("SECURE_COOKIES").unwrap_or(false);
        let allowed_origins = parse_origin_list(
            &std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.into()),
        );

        let rate_limit = if env_flag("RATE_LIMIT_ENABLED").unwrap_or(true) {
            Some(RateLimitConfig {
                requests: parse_env::<u32>("RATE_LIMIT_REQUESTS")
                    .filter(|n| *n > 0)
                    .unwrap_or(100),
                period_secs: parse_env::<u64>("RATE_LIMIT_PERIOD_SECS")
                    .filter(|n| *n > 0)
                    .unwrap_or(60),
            })
        } else {
            None
        };

        let body_limit_bytes = parse_env("MAX_BODY_BYTES").unwrap_or(defaults.body_limit_bytes);

        Self {
            host,
            port,
            database_url,
            cron_secret,
            session_ttl,
            secure_cookies,
            allowed_origins,
            rate_limit,
            body_limit_bytes,
        }
    }

    pub fn with_cron_secret(mut self, secret: impl Into<String>) -> Self {
        self.cron_secret = Some(secret.into());
        self
    }

    pub fn with_rate_limit(mut self, requests: u32, period_secs: u64) -> Self {
        self.rate_limit = Some(RateLimitConfig {
            requests,
            period_secs,
        });
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| v == "true" || v == "1")
}

/// Split a comma-separated origin list, dropping blanks. An empty list
/// falls back to the default origin.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        vec![DEFAULT_ALLOWED_ORIGINS.to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_cron_secret_or_limiter() {
        let config = ApiConfig::default();
        assert!(config.cron_secret.is_none());
        assert!(config.rate_limit.is_none());
        assert_eq!(config.session_ttl, chrono::Duration::hours(720));
    }

    #[test]
    fn test_parse_origin_list() {
        assert_eq!(
            parse_origin_list(" https://a.example, ,http://localhost:3000 "),
            vec!["https://a.example", "http://localhost:3000"]
        );
        assert_eq!(parse_origin_list("  "), vec![DEFAULT_ALLOWED_ORIGINS]);
    }

    #[test]
    fn test_builders() {
        let config = ApiConfig::default()
            .with_cron_secret("s3cret")
            .with_rate_limit(5, 1);
        assert_eq!(config.cron_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            config.rate_limit,
            Some(RateLimitConfig {
                requests: 5,
                period_secs: 1
            })
        );
    }
}
