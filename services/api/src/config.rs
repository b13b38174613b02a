//! services/api/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;

use card_catalog_core::gate::DEFAULT_SALT;
use card_catalog_core::HashScheme;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which record store backs the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(String),
    /// Process-local store, selected with `DATABASE_URL=memory://`.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store: StoreBackend,
    pub log_level: Level,
    /// Hash every admin password entry is compared against.
    pub admin_password_hash: String,
    pub gate_salt: String,
    pub gate_hash_scheme: HashScheme,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        // Session cookies ride on credentialed requests, which forbid a wildcard origin.
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        if cors_origin.trim() == "*" {
            return Err(ConfigError::InvalidValue(
                "CORS_ORIGIN".to_string(),
                "a wildcard origin cannot carry the session cookie; name the client origin".to_string(),
            ));
        }

        // --- Store ---
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let store = if database_url.trim() == "memory://" {
            StoreBackend::Memory
        } else {
            StoreBackend::Postgres(database_url)
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Password gate ---
        let admin_password_hash = lookup("ADMIN_PASSWORD_HASH")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("ADMIN_PASSWORD_HASH".to_string()))?;
        let gate_salt = lookup("GATE_SALT").unwrap_or_else(|| DEFAULT_SALT.to_string());
        let gate_hash_scheme = match lookup("GATE_HASH_SCHEME") {
            Some(raw) => raw
                .parse::<HashScheme>()
                .map_err(|e| ConfigError::InvalidValue("GATE_HASH_SCHEME".to_string(), e))?,
            None => HashScheme::Argon2,
        };

        Ok(Self {
            bind_address,
            store,
            log_level,
            admin_password_hash,
            gate_salt,
            gate_hash_scheme,
            cors_origin,
        })
    }
}
