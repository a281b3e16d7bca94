//! # Configuration for the corretores application
//!
//! Typed settings for the database pool, the public site and the HTTP server.
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "imovel_guide"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//!
//! [site]
//! name = "Imóvel Guide"
//! description = "Teste técnico Imóvel Guide"
//! base_path = "/imovel-guide/"
//! url_production = "https://imovelguide.glaucopereira.com"
//! url_development = "http://localhost/imovel-guide"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! session_idle_seconds = 1440
//! ```
//!
//! Every section is optional; missing values fall back to the defaults.
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // CORRETORES_CONFIG, ./corretores.toml or built-in defaults
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./corretores.toml";
const CONFIG_PATH_VAR: &str = "CORRETORES_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid value for {name}: {value}")]
    EnvValue { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub site: SiteConfig,
    pub server: ServerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// Public site identity and URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    /// Path prefix every route is mounted under, with leading and trailing `/`
    pub base_path: String,
    pub url_production: String,
    pub url_development: String,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions untouched for this long are dropped
    pub session_idle_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "imovel_guide".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            min_connections: 1,
            max_connections: 10,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            max_lifetime_seconds: 3600,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Imóvel Guide: Teste de Programação Glauco Pereira".to_string(),
            description: "Teste técnico Imóvel Guide".to_string(),
            base_path: "/imovel-guide/".to_string(),
            url_production: "https://imovelguide.glaucopereira.com".to_string(),
            url_development: "http://localhost/imovel-guide".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            session_idle_seconds: 1440,
        }
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named in .env, the default path,
    /// or built-in defaults, then apply `DB_*` environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        // a missing .env file is fine, a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }

        let mut config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::read_file(&config_path)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::read_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override database settings from `DB_HOST`, `DB_PORT`, `DB_NAME`,
    /// `DB_USER` and `DB_PASSWORD` as returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.database.port = port
                .parse()
                .map_err(|_| ConfigError::EnvValue { name: "DB_PORT", value: port })?;
        }
        if let Some(name) = lookup("DB_NAME") {
            self.database.database = name;
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.username = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = password;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Database validations
        if self.database.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Database host cannot be empty".to_string(),
            ));
        }
        if self.database.port == 0 {
            return Err(ConfigError::Invalid(
                "Database port cannot be zero".to_string(),
            ));
        }
        if self.database.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.database.username.is_empty() {
            return Err(ConfigError::Invalid(
                "Database username cannot be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if self.database.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // Site validations
        if !self.site.base_path.starts_with('/') || !self.site.base_path.ends_with('/') {
            return Err(ConfigError::Invalid(
                "Site base_path must start and end with '/'".to_string(),
            ));
        }

        // Server validations
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Server host cannot be empty".to_string(),
            ));
        }
        if self.server.session_idle_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Server session_idle_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.site.base_path, "/imovel-guide/");
        assert_eq!(config.database.database, "imovel_guide");
        assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            host = "db.internal"
            password = "secret"

            [site]
            base_path = "/"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.site.base_path, "/");
        assert_eq!(config.site.description, "Teste técnico Imóvel Guide");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_database_settings() {
        let vars: HashMap<&str, &str> = [
            ("DB_HOST", "pg"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "brokers"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "pw"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.host, "pg");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.database, "brokers");
        assert_eq!(config.database.username, "app");
        assert_eq!(config.database.password, "pw");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|name| (name == "DB_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvValue { name: "DB_PORT", .. }));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = AppConfig::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.site.base_path = "imovel-guide".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.host.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.session_idle_seconds = 0;
        assert!(config.validate().is_err());
    }
}
