// ABOUTME: Server configuration read from environment variables at startup
// ABOUTME: Covers bind address, SQLite location, session secret, mail links, media prefix and CORS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! FitHub reads all of its configuration from the process environment

use crate::constants::{defaults, env_config};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path of the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite://").or_else(|| s.strip_prefix("sqlite:"));
        match path_str {
            Some(":memory:") => Self::Memory,
            Some(path) => Self::SQLite {
                path: PathBuf::from(path),
            },
            // Fallback: treat as SQLite file path
            None => Self::SQLite {
                path: PathBuf::from(s),
            },
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(defaults::DATABASE_URL)
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Session verification settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret used by the session library to sign tokens
    pub session_secret: String,
    /// Expected `aud` claim
    pub session_audience: String,
    /// Lifetime of email verification and password reset tokens
    pub email_token_ttl_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"[REDACTED]")
            .field("session_audience", &self.session_audience)
            .field("email_token_ttl_minutes", &self.email_token_ttl_minutes)
            .finish()
    }
}

/// Outgoing email settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address
    pub from_address: String,
    /// Public web app URL used to build links in emails
    pub app_base_url: String,
}

/// Media (object storage) settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Required prefix for registered image URLs, if any
    pub public_base_url: Option<String>,
}

/// Top level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database URL
    pub database_url: DatabaseUrl,
    /// Session verification settings
    pub auth: AuthConfig,
    /// Email settings
    pub mail: MailConfig,
    /// Object storage settings
    pub media: MediaConfig,
    /// CORS allowed origins (`*` allows any)
    pub cors_origins: Vec<String>,
    /// Request body limit in bytes
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparsable value, or if the
    /// session secret is missing in production
    pub fn from_env() -> Result<Self> {
        let environment =
            Environment::from_str_or_default(&env_var_or(env_config::ENVIRONMENT, "development"));

        let session_secret = match env::var(env_config::SESSION_JWT_SECRET) {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment.is_production() => {
                return Err(anyhow::anyhow!(
                    "{} must be set in production",
                    env_config::SESSION_JWT_SECRET
                ));
            }
            _ => {
                warn!(
                    "{} not set, generating an ephemeral secret (sessions will not survive restarts)",
                    env_config::SESSION_JWT_SECRET
                );
                generate_ephemeral_secret()
            }
        };

        let config = Self {
            host: env_var_or(env_config::HOST, defaults::HOST),
            http_port: env_var_or(env_config::HTTP_PORT, &defaults::HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment,
            database_url: DatabaseUrl::parse_url(&env_var_or(
                env_config::DATABASE_URL,
                defaults::DATABASE_URL,
            )),
            auth: AuthConfig {
                session_secret,
                session_audience: env_var_or(
                    env_config::SESSION_AUDIENCE,
                    defaults::SESSION_AUDIENCE,
                ),
                email_token_ttl_minutes: env_var_or(
                    env_config::EMAIL_TOKEN_TTL_MINUTES,
                    &defaults::EMAIL_TOKEN_TTL_MINUTES.to_string(),
                )
                .parse()
                .context("Invalid EMAIL_TOKEN_TTL_MINUTES value")?,
            },
            mail: MailConfig {
                from_address: env_var_or(env_config::MAIL_FROM, defaults::MAIL_FROM),
                app_base_url: env_var_or(env_config::APP_BASE_URL, defaults::APP_BASE_URL)
                    .trim_end_matches('/')
                    .to_owned(),
            },
            media: MediaConfig {
                public_base_url: env::var(env_config::MEDIA_BASE_URL)
                    .ok()
                    .and_then(|v| normalize_media_base(&v)),
            },
            cors_origins: parse_origins(&env_var_or(env_config::CORS_ALLOWED_ORIGINS, "*")),
            max_body_bytes: env_var_or(
                env_config::MAX_BODY_BYTES,
                &defaults::MAX_BODY_BYTES.to_string(),
            )
            .parse()
            .context("Invalid MAX_BODY_BYTES value")?,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Configuration suitable for tests: in-memory database, fixed secret
    #[must_use]
    pub fn for_testing(session_secret: &str) -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: 0,
            environment: Environment::Testing,
            database_url: DatabaseUrl::Memory,
            auth: AuthConfig {
                session_secret: session_secret.to_owned(),
                session_audience: defaults::SESSION_AUDIENCE.to_owned(),
                email_token_ttl_minutes: defaults::EMAIL_TOKEN_TTL_MINUTES,
            },
            mail: MailConfig {
                from_address: defaults::MAIL_FROM.to_owned(),
                app_base_url: defaults::APP_BASE_URL.to_owned(),
            },
            media: MediaConfig::default(),
            cors_origins: vec!["*".to_owned()],
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when a value is out of its accepted range
    pub fn validate(&self) -> Result<()> {
        if self.auth.session_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "{} must be at least 16 characters",
                env_config::SESSION_JWT_SECRET
            ));
        }
        if self.auth.email_token_ttl_minutes <= 0 {
            return Err(anyhow::anyhow!("EMAIL_TOKEN_TTL_MINUTES must be positive"));
        }
        if let Some(base) = &self.media.public_base_url {
            // Photo URLs must be https, so an http prefix could never match
            if !base.starts_with("https://") || base.len() <= "https://".len() + 1 {
                return Err(anyhow::anyhow!(
                    "{} must be an https URL",
                    env_config::MEDIA_BASE_URL
                ));
            }
        }
        if self.environment.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            warn!("CORS allows any origin in production");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "FitHub Server Configuration:\n\
             - Environment: {}\n\
             - HTTP: {}:{}\n\
             - Database: {}\n\
             - Session Audience: {}\n\
             - Mail From: {}\n\
             - App URL: {}\n\
             - Media Prefix: {}\n\
             - CORS Origins: {}",
            self.environment,
            self.host,
            self.http_port,
            self.database_url,
            self.auth.session_audience,
            self.mail.from_address,
            self.mail.app_base_url,
            self.media.public_base_url.as_deref().unwrap_or("(any https)"),
            self.cors_origins.join(", "),
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_origins(origins_str: &str) -> Vec<String> {
    origins_str
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trimmed media prefix ending in exactly one `/`, `None` when blank
fn normalize_media_base(raw: &str) -> Option<String> {
    let base = raw.trim().trim_end_matches('/');
    (!base.is_empty()).then(|| format!("{base}/"))
}

fn generate_ephemeral_secret() -> String {
    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            env_config::ENVIRONMENT,
            env_config::SESSION_JWT_SECRET,
            env_config::HTTP_PORT,
            env_config::DATABASE_URL,
            env_config::MEDIA_BASE_URL,
            env_config::CORS_ALLOWED_ORIGINS,
            env_config::APP_BASE_URL,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("https://a.example, https://b.example,,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str_or_default("PROD"), Environment::Production);
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(Environment::from_str_or_default("weird"), Environment::Development);
    }

    #[test]
    fn test_database_url_parsing() {
        assert_eq!(DatabaseUrl::parse_url("sqlite::memory:"), DatabaseUrl::Memory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/app.db").to_connection_string(),
            "sqlite:./data/app.db"
        );
        assert_eq!(
            DatabaseUrl::parse_url("/tmp/app.db").to_connection_string(),
            "sqlite:/tmp/app.db"
        );
    }

    #[test]
    #[serial]
    fn test_production_requires_secret() {
        clear_env();
        env::set_var(env_config::ENVIRONMENT, "production");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_development_generates_secret() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.auth.session_secret.len() >= 16);
        assert_eq!(config.http_port, defaults::HTTP_PORT);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var(env_config::SESSION_JWT_SECRET, "a-very-long-shared-secret");
        env::set_var(env_config::HTTP_PORT, "9090");
        env::set_var(env_config::APP_BASE_URL, "https://app.example/");
        env::set_var(env_config::MEDIA_BASE_URL, "https://cdn.example/photos/");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.mail.app_base_url, "https://app.example");
        assert_eq!(
            config.media.public_base_url.as_deref(),
            Some("https://cdn.example/photos/")
        );
        assert!(!config.summary().contains("a-very-long-shared-secret"));
        clear_env();
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = ServerConfig::for_testing("0123456789abcdef");
        assert!(config.validate().is_ok());
        config.auth.session_secret = "short".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_media_base_is_https_with_trailing_slash() {
        clear_env();
        env::set_var(env_config::SESSION_JWT_SECRET, "a-very-long-shared-secret");
        env::set_var(env_config::MEDIA_BASE_URL, " https://media.fithub.test ");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.media.public_base_url.as_deref(),
            Some("https://media.fithub.test/")
        );

        env::set_var(env_config::MEDIA_BASE_URL, "http://media.fithub.test/");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_normalize_media_base() {
        assert_eq!(normalize_media_base("   "), None);
        assert_eq!(normalize_media_base("https://a.test//").as_deref(), Some("https://a.test/"));
    }
}
