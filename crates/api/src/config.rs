//! Application configuration

use std::env;

/// Which message store backs the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,

    // Storage
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub auth_required: bool,

    // Clients
    pub typing_indicator_ttl_secs: u64,

    // Logging
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid("STORE_BACKEND must be postgres or memory")),
            },
            Err(_) if database_url.is_some() => StoreBackend::Postgres,
            Err(_) => StoreBackend::Memory,
        };

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5003".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            // Storage
            store_backend,
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            auth_required: env::var("AUTH_REQUIRED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            // Clients
            typing_indicator_ttl_secs: env::var("TYPING_INDICATOR_TTL_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),

            // Logging
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BIND_ADDRESS",
        "CORS_ALLOWED_ORIGINS",
        "STORE_BACKEND",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "JWT_SECRET",
        "AUTH_REQUIRED",
        "TYPING_INDICATOR_TTL_SECS",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_use_memory_store() {
        clear_env();
        env::set_var("JWT_SECRET", "a-very-long-test-secret-for-the-relay!!");

        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.bind_address, "0.0.0.0:5003");
        assert_eq!(config.typing_indicator_ttl_secs, 3);
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert!(!config.auth_required);
        assert_eq!(config.log_format, LogFormat::Pretty);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_database_url_selects_postgres() {
        clear_env();
        env::set_var("JWT_SECRET", "a-very-long-test-secret-for-the-relay!!");
        env::set_var("DATABASE_URL", "postgres://localhost/chat");

        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_postgres_without_url_is_rejected() {
        clear_env();
        env::set_var("JWT_SECRET", "a-very-long-test-secret-for-the-relay!!");
        env::set_var("STORE_BACKEND", "postgres");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_short_jwt_secret_is_rejected() {
        clear_env();
        env::set_var("JWT_SECRET", "short");

        assert!(matches!(Config::from_env(), Err(ConfigError::WeakSecret(_))));
        clear_env();
    }
}
