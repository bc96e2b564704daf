// ABOUTME: Shared server resources, the full HTTP router and the serve loop with graceful shutdown
// ABOUTME: Every route module receives the same `Arc<ServerResources>` as axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # HTTP Server
//!
//! [`build_router`] merges the health, auth utility, option, dashboard and
//! admin routers and wraps them in the tower layers every request passes
//! through: request ids, tracing, CORS and a body size limit.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use http::HeaderName;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::email::{EmailSender, LogEmailSender};
use crate::middleware::{setup_cors, RequestSpan, REQUEST_ID_HEADER};
use crate::routes::{AdminRoutes, AuthEmailRoutes, DashboardRoutes, HealthRoutes, OptionsRoutes};

/// Everything request handlers need, shared behind an `Arc`
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Session token verification
    pub auth: AuthManager,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Outbound mail
    pub email: Arc<dyn EmailSender>,
}

impl ServerResources {
    /// Assemble resources; the auth manager is derived from the config
    #[must_use]
    pub fn new(database: Database, config: Arc<ServerConfig>, email: Arc<dyn EmailSender>) -> Self {
        let auth = AuthManager::new(&config.auth.session_secret, config.auth.session_audience.clone());
        Self {
            database,
            auth,
            config,
            email,
        }
    }

    /// Public storage prefix progress photo URLs must start with
    #[must_use]
    pub fn media_prefix(&self) -> Option<&str> {
        self.config.media.public_base_url.as_deref()
    }
}

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let cors = setup_cors(&resources.config);
    let body_limit = resources.config.max_body_bytes;

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthEmailRoutes::routes(resources.clone()))
        .merge(OptionsRoutes::routes(resources.clone()))
        .merge(DashboardRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                .layer(PropagateRequestIdLayer::new(request_id))
                // Outside the CORS layer: preflight responses need a `Default` body
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(cors),
        )
}

/// Connect the database, bind the listener and serve until a shutdown signal
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the port cannot be
/// bound or the server fails
pub async fn run(config: ServerConfig) -> Result<()> {
    info!("{}", config.summary());
    let database = Database::new(&config.database_url.to_connection_string())
        .await
        .context("Failed to open database")?;

    let addr = format!("{}:{}", config.host, config.http_port);
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::new(config),
        Arc::new(LogEmailSender),
    ));
    let app = build_router(resources);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "FitHub server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("FitHub server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received, draining connections");
}
