//! Application configuration loaded from environment variables.

use std::time::Duration;

use shop::SupabaseConfig;
use shop::auth::token::DEFAULT_TOKEN_TTL;
use thiserror::Error;

/// Errors that prevent the server from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to something unusable.
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `4000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `"json"` for JSON log lines, anything else for text
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `JWT_SECRET`: token signing secret (required)
/// - `JWT_EXPIRES_IN`: token lifetime such as `"7d"` or `"3600"` (default: `"7d"`)
/// - `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`, `SUPABASE_PUBLIC_URL`,
///   `SUPABASE_BUCKET`: object storage for signed uploads
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    /// `None` when object storage is not fully configured.
    pub supabase: Option<SupabaseConfig>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, treating empty values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 4000,
        };
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
            None => 10,
        };
        let jwt_ttl = match var("JWT_EXPIRES_IN") {
            Some(raw) => shop::parse_expiry(&raw).ok_or(ConfigError::Invalid {
                name: "JWT_EXPIRES_IN",
                value: raw,
            })?,
            None => DEFAULT_TOKEN_TTL,
        };
        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let supabase = match (
            var("SUPABASE_URL"),
            var("SUPABASE_SERVICE_ROLE_KEY"),
            var("SUPABASE_BUCKET"),
        ) {
            (Some(url), Some(service_role_key), Some(bucket)) => Some(SupabaseConfig {
                url,
                service_role_key,
                public_url: var("SUPABASE_PUBLIC_URL"),
                bucket,
            }),
            _ => None,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            json_logs: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: var("DATABASE_URL"),
            database_max_connections,
            jwt_secret,
            jwt_ttl,
            supabase,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.jwt_ttl, DEFAULT_TOKEN_TTL);
        assert!(config.supabase.is_none());
    }

    #[test]
    fn test_jwt_secret_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(
            load(&[("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load(&[("JWT_SECRET", "s"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = load(&[("JWT_SECRET", "s"), ("JWT_EXPIRES_IN", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_EXPIRES_IN", .. }));

        let err = load(&[("JWT_SECRET", "s"), ("DATABASE_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. }));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("JWT_EXPIRES_IN", "12h"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "key"),
            ("SUPABASE_BUCKET", "images"),
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert!(config.json_logs);
        assert_eq!(config.jwt_ttl, Duration::from_secs(12 * 60 * 60));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));

        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.bucket, "images");
        assert_eq!(supabase.public_url, None);
    }

    #[test]
    fn test_partial_supabase_is_unconfigured() {
        let config = load(&[("JWT_SECRET", "s"), ("SUPABASE_URL", "https://x.supabase.co")])
            .unwrap();
        assert!(config.supabase.is_none());
    }
}
