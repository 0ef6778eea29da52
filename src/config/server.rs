//! Server settings read from the environment (`.env` is loaded by `main`).

use crate::errors::{Error, Result};
use std::path::PathBuf;

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// `SeaORM` connection URL
    pub database_url: String,
    /// Allowed CORS origin; `None` allows any origin
    pub frontend_url: Option<String>,
    /// Seed file applied at startup when `seed_db` is set
    pub seed_file: PathBuf,
    /// Whether to seed the catalog on startup
    pub seed_db: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: super::database::DEFAULT_DATABASE_URL.to_string(),
            frontend_url: None,
            seed_file: PathBuf::from("seed.toml"),
            seed_db: false,
        }
    }
}

impl ServerConfig {
    /// Builds the config from environment variables, falling back to defaults.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when `SERVER_PORT` or `SEED_DB` cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reading from an arbitrary source.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when a value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| Error::Config {
                message: format!("Invalid SERVER_PORT '{raw}': {e}"),
            })?,
            None => defaults.port,
        };

        let seed_db = match lookup("SEED_DB") {
            Some(raw) => raw.parse::<bool>().map_err(|e| Error::Config {
                message: format!("Invalid SEED_DB '{raw}': {e}"),
            })?,
            None => defaults.seed_db,
        };

        let frontend_url = lookup("FRONTEND_URL").filter(|url| !url.is_empty() && url != "*");

        let config = Self {
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            frontend_url,
            seed_file: lookup("SEED_FILE").map_or(defaults.seed_file, PathBuf::from),
            seed_db,
        };
        tracing::debug!(host = %config.host, port = config.port, "Server configuration loaded");
        Ok(config)
    }

    /// `host:port` string for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
