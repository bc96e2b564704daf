// ABOUTME: Tracing subscriber setup for the server and the command line tools
// ABOUTME: Also holds the structured domain events logged by the catalog, auth and mail code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Structured logging
//!
//! The server logs through `tracing`. Output format and verbosity come from
//! the environment so a deployment can switch to JSON without a rebuild:
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | filter directives, `info` when unset |
//! | `LOG_FORMAT` | `json`, `pretty` (default) or `compact` |
//! | `LOG_INCLUDE_LOCATION` | add file and line, always on in production |
//! | `ENVIRONMENT` | reported on the startup record |
//! | `SERVICE_NAME` | reported on the startup record |

use std::env;
use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::Environment;
use crate::constants::{env_config, service_names};

/// Dependencies that are chatty at `info`
const QUIET_TARGETS: [&str; 4] = ["hyper=warn", "sqlx=warn", "sqlx::query=warn", "tower_http=info"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per record
    Json,
    /// Human readable, multi-field lines
    #[default]
    Pretty,
    /// Single short line per record
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value; anything unknown is pretty
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// How the global subscriber is built
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub filter: String,
    /// Output format
    pub format: LogFormat,
    /// Deployment environment
    pub environment: Environment,
    /// Reported service name
    pub service_name: String,
    /// Add source file and line to each record
    pub with_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::default(),
            environment: Environment::default(),
            service_name: service_names::FITHUB_SERVER.to_owned(),
            with_location: false,
        }
    }
}

impl LoggingConfig {
    /// Read the logging variables from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let environment = env::var(env_config::ENVIRONMENT)
            .map(|v| Environment::from_str_or_default(&v))
            .unwrap_or_default();
        Self {
            filter: env::var(env_config::RUST_LOG).unwrap_or_else(|_| "info".to_owned()),
            format: LogFormat::parse(&env::var(env_config::LOG_FORMAT).unwrap_or_default()),
            environment,
            service_name: env::var(env_config::SERVICE_NAME)
                .unwrap_or_else(|_| service_names::FITHUB_SERVER.to_owned()),
            with_location: environment.is_production()
                || env::var_os(env_config::LOG_INCLUDE_LOCATION).is_some(),
        }
    }

    /// Compact logging for one-shot tools such as the catalog seeder
    #[must_use]
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            filter: if verbose { "debug" } else { "info" }.to_owned(),
            format: LogFormat::Compact,
            ..Self::default()
        }
    }

    /// The configured directives plus the dependency overrides
    fn env_filter(&self) -> EnvFilter {
        let mut filter =
            EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("info"));
        for directive in QUIET_TARGETS.iter().filter_map(|d| d.parse::<Directive>().ok()) {
            filter = filter.add_directive(directive);
        }
        filter
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.with_location)
            .with_line_number(self.with_location);
        match self.format {
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.fmt_layer().with_filter(self.env_filter()))
            .try_init()?;

        info!(
            service.name = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.filter = %self.filter,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install the global subscriber from the environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured domain events
pub struct AppLogger;

impl AppLogger {
    /// A shared workout was cloned before an edit
    pub fn log_workout_copied(original_id: &str, clone_id: &str, program_workout_id: &str) {
        info!(
            workout.original = %original_id,
            workout.clone = %clone_id,
            program_workout.id = %program_workout_id,
            "Shared workout copied before edit"
        );
    }

    /// An achievement was awarded
    pub fn log_achievement_awarded(user_id: &str, achievement: &str, points: u32) {
        info!(
            user.id = %user_id,
            achievement.name = %achievement,
            achievement.points = points,
            "Achievement awarded"
        );
    }

    /// A request was rejected by the session guard
    pub fn log_auth_failure(reason: &str, path: &str) {
        warn!(auth.reason = %reason, http.path = %path, "Authentication rejected");
    }

    /// A rendered email was handed to the sender
    pub fn log_email_dispatched(template: &str, recipient: &str, success: bool) {
        info!(
            email.template = %template,
            email.recipient = %recipient,
            email.success = success,
            "Email dispatched"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
    }

    #[test]
    fn test_cli_config_is_compact() {
        let config = LoggingConfig::for_cli(true);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.filter, "debug");
        assert_eq!(LoggingConfig::for_cli(false).filter, "info");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LoggingConfig {
            filter: "not==valid".to_owned(),
            ..LoggingConfig::default()
        };
        let rendered = config.env_filter().to_string();
        assert!(!rendered.contains("not"));
        assert!(rendered.contains("sqlx=warn"));
    }
}
