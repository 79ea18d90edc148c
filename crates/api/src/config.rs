use std::fmt::Display;
use std::str::FromStr;

use signoff_core::tokens::{DEFAULT_PARTY_TOKEN_TTL_DAYS, DEFAULT_RECIPIENT_TOKEN_TTL_DAYS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the server stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT verification settings for the admin surface.
    pub jwt: JwtConfig,
    /// Capability-token lifetimes and public link base.
    pub signing: SigningConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but does not parse, and on any
    /// invalid JWT or signing setting.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            signing: SigningConfig::from_env(),
        }
    }
}

/// Settings for the anonymous signing links.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Public origin of the signing UI; links are `{base_url}/sign/{kind}/{token}`.
    pub base_url: String,
    pub party_token_ttl_days: i64,
    pub recipient_token_ttl_days: i64,
}

impl SigningConfig {
    /// Load signing configuration from environment variables.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `SIGNING_BASE_URL`         | `http://localhost:5173` |
    /// | `PARTY_TOKEN_TTL_DAYS`     | `30`                    |
    /// | `RECIPIENT_TOKEN_TTL_DAYS` | `14`                    |
    ///
    /// # Panics
    ///
    /// Panics if a TTL is not a positive integer.
    pub fn from_env() -> Self {
        let base_url = std::env::var("SIGNING_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into());

        let party_token_ttl_days = require_positive(
            "PARTY_TOKEN_TTL_DAYS",
            env_or("PARTY_TOKEN_TTL_DAYS", DEFAULT_PARTY_TOKEN_TTL_DAYS),
        );
        let recipient_token_ttl_days = require_positive(
            "RECIPIENT_TOKEN_TTL_DAYS",
            env_or("RECIPIENT_TOKEN_TTL_DAYS", DEFAULT_RECIPIENT_TOKEN_TTL_DAYS),
        );

        Self {
            base_url,
            party_token_ttl_days,
            recipient_token_ttl_days,
        }
    }

    pub fn party_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.party_token_ttl_days)
    }

    pub fn recipient_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.recipient_token_ttl_days)
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".into(),
            party_token_ttl_days: DEFAULT_PARTY_TOKEN_TTL_DAYS,
            recipient_token_ttl_days: DEFAULT_RECIPIENT_TOKEN_TTL_DAYS,
        }
    }
}

/// Read `name` from the environment, or `default` when it is unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse as `T`.
pub(crate) fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    parse_setting(name, std::env::var(name).ok(), default)
}

/// # Panics
///
/// Panics if `value` is zero or negative.
pub(crate) fn require_positive(name: &str, value: i64) -> i64 {
    assert!(value > 0, "{name} must be positive, got {value}");
    value
}

fn parse_setting<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            panic!(
                "{name} must be a valid {}: {e}",
                std::any::type_name::<T>()
            )
        }),
    }
}
