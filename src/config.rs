//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection options
    pub database: PgConnectOptions,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Upper bound on handling a single request
    pub request_timeout: Duration,

    /// Explicit log format (`json` or `text`); unset follows the environment
    pub log_format: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = database_options(&lookup)?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS"))?;

        let log_format = lookup("LOG_FORMAT");

        Ok(Self {
            database,
            database_max_connections,
            host,
            port,
            environment,
            request_timeout,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether logs are emitted as JSON lines.
    ///
    /// `LOG_FORMAT` decides when set; otherwise production logs JSON and
    /// every other environment logs human-readable text.
    pub fn json_logs(&self) -> bool {
        match &self.log_format {
            Some(format) => format.eq_ignore_ascii_case("json"),
            None => self.is_production(),
        }
    }
}

/// `DATABASE_URL` wins; otherwise the discrete `DB_*` variables are used.
fn database_options<F>(lookup: &F) -> Result<PgConnectOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return PgConnectOptions::from_str(&url)
            .map_err(|_| ConfigError::InvalidValue("DATABASE_URL"));
    }

    let host = lookup("DB_HOST").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;
    let user = lookup("DB_USER").ok_or(ConfigError::MissingEnv("DB_USER"))?;
    let database = lookup("DB_NAME").ok_or(ConfigError::MissingEnv("DB_NAME"))?;

    let port = lookup("DB_PORT")
        .unwrap_or_else(|| "5432".to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue("DB_PORT"))?;

    let ssl_mode = match lookup("DB_SSLMODE") {
        Some(mode) => {
            PgSslMode::from_str(&mode).map_err(|_| ConfigError::InvalidValue("DB_SSLMODE"))?
        }
        None => PgSslMode::Prefer,
    };

    let mut options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&user)
        .database(&database)
        .ssl_mode(ssl_mode);

    if let Some(password) = lookup("DB_PASSWORD") {
        options = options.password(&password);
    }

    Ok(options)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
