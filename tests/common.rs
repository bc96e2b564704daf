// ABOUTME: Test fixtures shared by the HTTP integration suites
// ABOUTME: Builds in-memory server resources, the full router and signed session tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `fithub_server`

use std::sync::{Arc, Once};

use axum::Router;
use chrono::Duration;
use fithub_server::{
    auth::{AuthenticatedUser, UserRole},
    config::ServerConfig,
    database::Database,
    email::MemoryEmailSender,
    server::{build_router, ServerResources},
};

pub const TEST_SECRET: &str = "integration-test-session-secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };
        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// A running app without a socket: router, resources and captured mail
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub mail: Arc<MemoryEmailSender>,
}

impl TestApp {
    /// Fresh in-memory database and router
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::for_testing(TEST_SECRET)).await
    }

    /// Fresh app with a customized configuration
    pub async fn with_config(config: ServerConfig) -> Self {
        init_test_logging();
        let database = Database::new("sqlite::memory:")
            .await
            .expect("in-memory database");
        let mail = Arc::new(MemoryEmailSender::new());
        let resources = Arc::new(ServerResources::new(
            database,
            Arc::new(config),
            mail.clone(),
        ));
        Self { resources, mail }
    }

    /// The complete router
    pub fn router(&self) -> Router {
        build_router(self.resources.clone())
    }

    /// Database handle
    pub fn db(&self) -> &Database {
        &self.resources.database
    }

    /// Session token for a regular user
    pub fn user_token(&self, user_id: &str) -> String {
        self.token_for(user_id, UserRole::User)
    }

    /// Session token for an administrator
    pub fn admin_token(&self) -> String {
        self.token_for("admin-1", UserRole::Admin)
    }

    /// Session token with an explicit role
    pub fn token_for(&self, user_id: &str, role: UserRole) -> String {
        self.resources
            .auth
            .issue_token(&session_user(user_id, role), Duration::hours(1))
            .expect("issue session token")
    }
}

/// The claims a session token for `user_id` carries
pub fn session_user(user_id: &str, role: UserRole) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user_id.to_owned(),
        email: format!("{user_id}@example.com"),
        name: Some(format!("Tester {user_id}")),
        role,
    }
}
