// ABOUTME: Email utility routes: address verification and password reset token handling
// ABOUTME: Issues single-use tokens, emails links to the web app and redeems the tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Email verification and password reset helpers
//!
//! Passwords themselves belong to the session library. These endpoints
//! only prove control of an inbox: they email a link carrying a token and
//! redeem it once. Reset requests answer the same way whether or not the
//! address is known.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{require_user, AuthenticatedUser};
use crate::database::email_tokens::EmailTokenPurpose;
use crate::email::{dispatch, templates, EmailMessage};
use crate::errors::{AppError, AppResult};
use crate::server::ServerResources;
use crate::utils::validation::email_address;

/// Body carrying an emailed token
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Token from the link
    pub token: String,
}

/// Body of a password reset request
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    /// Account email address
    pub email: String,
}

/// Result of a redeemed password reset token
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordResetVerified {
    /// Account the reset applies to
    pub user_id: String,
    /// Its email address
    pub email: String,
}

/// Email verification and password reset routes
pub struct AuthEmailRoutes;

impl AuthEmailRoutes {
    /// Create the email utility routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let authenticated = Router::new()
            .route(
                "/api/auth/verify-email/request",
                post(Self::handle_verify_request),
            )
            .route_layer(middleware::from_fn_with_state(resources.clone(), require_user));

        Router::new()
            .route(
                "/api/auth/verify-email/confirm",
                post(Self::handle_verify_confirm),
            )
            .route(
                "/api/auth/password-reset/request",
                post(Self::handle_reset_request),
            )
            .route(
                "/api/auth/password-reset/verify",
                post(Self::handle_reset_verify),
            )
            .merge(authenticated)
            .with_state(resources)
    }

    fn token_ttl(resources: &ServerResources) -> Duration {
        Duration::minutes(resources.config.auth.email_token_ttl_minutes)
    }

    fn link(resources: &ServerResources, path: &str, token: &str) -> String {
        format!("{}{path}?token={token}", resources.config.mail.app_base_url)
    }

    async fn send(resources: &ServerResources, to: &str, rendered: templates::RenderedEmail) {
        let message = EmailMessage::new(&resources.config.mail.from_address, to, rendered);
        if let Err(e) = dispatch(resources.email.as_ref(), &message).await {
            warn!(template = message.template, error = %e, "Email could not be sent");
        }
    }

    fn require_token(body: &TokenRequest) -> AppResult<&str> {
        let token = body.token.trim();
        if token.is_empty() {
            return Err(AppError::invalid_input("token is required"));
        }
        Ok(token)
    }

    /// Handle POST /api/auth/verify-email/request
    async fn handle_verify_request(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
    ) -> Result<Response, AppError> {
        let account = resources
            .database
            .users()
            .get(&user.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        if account.email_verified {
            return Ok(Json(serde_json::json!({ "status": "already_verified" })).into_response());
        }

        let ttl = Self::token_ttl(&resources);
        let issued = resources
            .database
            .email_tokens()
            .issue(&account.id, EmailTokenPurpose::VerifyEmail, ttl)
            .await?;
        let link = Self::link(&resources, "/verify-email", &issued.token);
        Self::send(
            &resources,
            &account.email,
            templates::verify_email(account.display_name.as_deref(), &link, ttl.num_minutes()),
        )
        .await;

        Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "sent" })),
        )
            .into_response())
    }

    /// Handle POST /api/auth/verify-email/confirm
    async fn handle_verify_confirm(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<TokenRequest>,
    ) -> Result<Response, AppError> {
        let token = Self::require_token(&body)?;
        let user_id = resources
            .database
            .email_tokens()
            .consume(token, EmailTokenPurpose::VerifyEmail)
            .await?;
        resources.database.users().mark_email_verified(&user_id).await?;
        info!(user.id = %user_id, "Email address verified");

        Ok(Json(serde_json::json!({
            "user_id": user_id,
            "email_verified": true
        }))
        .into_response())
    }

    /// Handle POST /api/auth/password-reset/request
    async fn handle_reset_request(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<PasswordResetRequest>,
    ) -> Result<Response, AppError> {
        let email = email_address("email", &body.email)?;

        if let Some(account) = resources.database.users().get_by_email(&email).await? {
            let ttl = Self::token_ttl(&resources);
            let issued = resources
                .database
                .email_tokens()
                .issue(&account.id, EmailTokenPurpose::PasswordReset, ttl)
                .await?;
            let link = Self::link(&resources, "/reset-password", &issued.token);
            Self::send(
                &resources,
                &account.email,
                templates::password_reset(account.display_name.as_deref(), &link, ttl.num_minutes()),
            )
            .await;
        } else {
            info!("Password reset requested for an unknown address");
        }

        Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "status": "accepted",
                "message": "If the address belongs to an account, a reset link is on its way"
            })),
        )
            .into_response())
    }

    /// Handle POST /api/auth/password-reset/verify
    async fn handle_reset_verify(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<TokenRequest>,
    ) -> Result<Json<PasswordResetVerified>, AppError> {
        let token = Self::require_token(&body)?;
        let user_id = resources
            .database
            .email_tokens()
            .consume(token, EmailTokenPurpose::PasswordReset)
            .await?;
        let account = resources
            .database
            .users()
            .get(&user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Token is no longer valid"))?;

        Ok(Json(PasswordResetVerified {
            user_id: account.id,
            email: account.email,
        }))
    }
}
