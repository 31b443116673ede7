//! Server configuration
//!
//! Values are layered: built-in defaults, then an optional configuration
//! file (YAML, TOML or JSON), then `SGC__*` environment variables. Nested
//! keys use a double underscore, e.g. `SGC__DATABASE__MAX_CONNECTIONS=10`.
//! `SGC_ENV` and `DATABASE_URL` are honoured as shorthands.

use config::{Config, ConfigError, Environment, File};
use database_layer::connection::PoolSettings;
use error_common::SgcError;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::path::PathBuf;

/// Signing secret used when none is configured; refused in production
pub const DEVELOPMENT_JWT_SECRET: &str = "sgc-development-secret-change-me";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `development` or `production`
    pub environment: String,
    /// PostgreSQL URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub database: PoolSettings,
    pub run_migrations: bool,
    /// Root directory for uploaded files; kept in memory when absent
    pub storage_dir: Option<PathBuf>,
    /// Base of the URLs handed out for uploaded files
    pub public_base_url: Option<String>,
    pub jwt_secret: Secret<String>,
    pub jwt_issuer: String,
    pub token_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    /// Body limit for document uploads, which arrive base64 encoded
    pub max_upload_bytes: usize,
}

/// Default upload body limit; fits a 30 MB file after base64 expansion
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 40 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
            database_url: None,
            database: PoolSettings::default(),
            run_migrations: true,
            storage_dir: None,
            public_base_url: None,
            jwt_secret: Secret::new(DEVELOPMENT_JWT_SECRET.to_string()),
            jwt_issuer: "sgc-engine".to_string(),
            token_ttl_secs: 8 * 60 * 60,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load from an optional file plus the environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("SGC")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors_origins")
                .try_parsing(true),
        );

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        if let Ok(environment) = std::env::var("SGC_ENV") {
            config.environment = environment;
        }
        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Base URL for file links, without a trailing slash
    pub fn public_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    pub fn validate(&self) -> Result<(), SgcError> {
        if self.token_ttl_secs <= 0 {
            return Err(SgcError::ConfigError(
                "token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(SgcError::ConfigError(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        let secret = self.jwt_secret.expose_secret();
        if secret.len() < 16 {
            return Err(SgcError::ConfigError(
                "jwt_secret must be at least 16 characters".to_string(),
            ));
        }
        if self.is_production() && secret == DEVELOPMENT_JWT_SECRET {
            return Err(SgcError::ConfigError(
                "set SGC__JWT_SECRET before running in production".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid_for_development() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.public_url(), "http://localhost:8080");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_zero_upload_limit_is_rejected() {
        let config = ServerConfig {
            max_upload_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(ServerConfig::default().max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_production_rejects_development_secret() {
        let config = ServerConfig {
            environment: "production".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            environment: "production".to_string(),
            jwt_secret: Secret::new("a-much-longer-production-secret".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let config = ServerConfig {
            public_base_url: Some("https://sgc.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.public_url(), "https://sgc.example.com");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "port = 9001\nstorage_dir = \"/var/lib/sgc\"\ncors_origins = [\"https://sgc.example.com\"]\n\n[database]\nmax_connections = 5"
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/sgc")));
        assert_eq!(config.cors_origins, vec!["https://sgc.example.com".to_string()]);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.jwt_issuer, "sgc-engine");
    }
}
