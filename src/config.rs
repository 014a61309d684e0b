//! Layered service configuration.
//!
//! Values come from an optional `twinfix.yaml` in the working directory,
//! overridden by `TWINFIX__`-prefixed environment variables whose path
//! segments are separated by double underscores (for example
//! `TWINFIX__DATABASE__URL` or `TWINFIX__SERVER__BIND`). A `.env` file is
//! loaded into the environment first when present.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Base name of the optional configuration file.
pub const CONFIG_FILE: &str = "twinfix";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "TWINFIX";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialised.
    #[error("configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    /// The `.env` file exists but could not be read.
    #[error("failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` database path or URL.
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Milliseconds a writer waits for the database lock.
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Returns the busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "twinfix.db".to_owned(),
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
}

/// Loads configuration from `twinfix.yaml` and the environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when a source is malformed or a value fails
/// validation.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        return Err(ConfigError::Dotenv(err));
    }
    let builder = config::Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(environment());
    build(builder)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let app: AppConfig = builder.build()?.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if app.database.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database.url must not be empty".to_owned(),
        ));
    }
    if app.database.pool_size == 0 {
        return Err(ConfigError::Validation(
            "database.pool_size must be > 0".to_owned(),
        ));
    }
    Ok(())
}

/// Parses configuration from YAML text without consulting the environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when the text is malformed or fails validation.
pub fn from_yaml(yaml: &str) -> Result<AppConfig, ConfigError> {
    build(config::Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_yaml_yields_defaults() {
        let app = from_yaml("{}").expect("empty document should load");
        assert_eq!(app, AppConfig::default());
        assert_eq!(app.database.busy_timeout(), Duration::from_secs(5));
    }

    #[rstest]
    fn yaml_overrides_nested_values() {
        let app = from_yaml(concat!(
            "server:\n",
            "  bind: 0.0.0.0:9000\n",
            "database:\n",
            "  url: /var/lib/twinfix/data.db\n",
            "  pool_size: 2\n",
        ))
        .expect("document should load");

        assert_eq!(app.server.bind, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(app.database.url, "/var/lib/twinfix/data.db");
        assert_eq!(app.database.pool_size, 2);
        assert_eq!(app.database.busy_timeout_ms, 5_000);
    }

    #[rstest]
    #[case("database:\n  pool_size: 0\n", "pool_size")]
    #[case("database:\n  url: ''\n", "url")]
    fn invalid_values_are_rejected(#[case] yaml: &str, #[case] field: &str) {
        let err = from_yaml(yaml).expect_err("invalid value should be rejected");
        assert!(matches!(err, ConfigError::Validation(ref message) if message.contains(field)));
    }
}
