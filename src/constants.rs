// ABOUTME: System-wide constants and configuration defaults for the FitHub server
// ABOUTME: Environment variable names, defaults, limits, and service identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Constants Module
//!
//! Application constants and the names of the environment variables the
//! server reads.

/// Service identifiers used in logs and token audiences
pub mod service_names {
    /// Name reported by structured logging
    pub const FITHUB_SERVER: &str = "fithub-server";
}

/// Environment variable names
pub mod env_config {
    /// Deployment environment (`development`, `production`, `testing`)
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Bind host
    pub const HOST: &str = "HOST";
    /// HTTP port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Shared secret of the session library
    pub const SESSION_JWT_SECRET: &str = "SESSION_JWT_SECRET";
    /// Expected session token audience
    pub const SESSION_AUDIENCE: &str = "SESSION_AUDIENCE";
    /// Lifetime of emailed tokens
    pub const EMAIL_TOKEN_TTL_MINUTES: &str = "EMAIL_TOKEN_TTL_MINUTES";
    /// Sender address for outgoing mail
    pub const MAIL_FROM: &str = "MAIL_FROM";
    /// Public web app URL
    pub const APP_BASE_URL: &str = "APP_BASE_URL";
    /// Object storage public prefix
    pub const MEDIA_BASE_URL: &str = "MEDIA_BASE_URL";
    /// Comma separated CORS origins
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
    /// Request body limit
    pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";
    /// Log filter directives
    pub const RUST_LOG: &str = "RUST_LOG";
    /// Log output format (`json`, `pretty`, `compact`)
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    /// Add file and line to log records
    pub const LOG_INCLUDE_LOCATION: &str = "LOG_INCLUDE_LOCATION";
    /// Service name attached to the startup log record
    pub const SERVICE_NAME: &str = "SERVICE_NAME";
}

/// Default configuration values
pub mod defaults {
    /// Bind host
    pub const HOST: &str = "127.0.0.1";
    /// HTTP port
    pub const HTTP_PORT: u16 = 8081;
    /// Database URL
    pub const DATABASE_URL: &str = "sqlite:./data/fithub.db";
    /// Session token audience
    pub const SESSION_AUDIENCE: &str = "fithub";
    /// Email token lifetime
    pub const EMAIL_TOKEN_TTL_MINUTES: i64 = 60;
    /// Sender address
    pub const MAIL_FROM: &str = "FitHub <no-reply@fithub.local>";
    /// Web app URL
    pub const APP_BASE_URL: &str = "http://localhost:3000";
    /// One megabyte of JSON is far beyond any form payload
    pub const MAX_BODY_BYTES: usize = 1024 * 1024;
}

/// Session transport
pub mod session {
    /// Cookie carrying the session token when no bearer header is sent
    pub const COOKIE_NAME: &str = "session_token";
    /// Role claim value granting back office access
    pub const ADMIN_ROLE: &str = "admin";
}

/// Domain limits
pub mod limits {
    /// Longest accepted title or name
    pub const MAX_TITLE_LEN: usize = 200;
    /// Longest accepted free text field
    pub const MAX_TEXT_LEN: usize = 20_000;
    /// Most sets allowed in a workout exercise
    pub const MAX_SETS: u32 = 50;
    /// Most weeks in a training program
    pub const MAX_PROGRAM_WEEKS: u32 = 52;
}
