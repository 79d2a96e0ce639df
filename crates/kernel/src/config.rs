//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 5000).
    pub port: u16,

    /// PostgreSQL connection URL. When unset, the in-memory store is used.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// HMAC secret for session tokens.
    pub jwt_secret: String,

    /// Session token lifetime in days (default: 30).
    pub session_token_ttl_days: i64,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .context("JWT_SECRET environment variable is required")?;

        let session_token_ttl_days: i64 = lookup("SESSION_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("SESSION_TOKEN_TTL_DAYS must be a valid integer")?;
        if session_token_ttl_days <= 0 {
            anyhow::bail!("SESSION_TOKEN_TTL_DAYS must be positive");
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            session_token_ttl_days,
            cors_allowed_origins,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "secret")]).unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.session_token_ttl_days, 30);
        assert_eq!(config.cors_allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "")]).is_err());
    }

    #[test]
    fn blank_database_url_selects_memory_store() {
        let config = load(&[("JWT_SECRET", "s"), ("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[
            ("JWT_SECRET", "s"),
            ("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(load(&[("JWT_SECRET", "s"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert!(load(&[("JWT_SECRET", "s"), ("SESSION_TOKEN_TTL_DAYS", "0")]).is_err());
    }
}
