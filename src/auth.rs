// ABOUTME: Session token verification for tokens issued by the external session library
// ABOUTME: Validates HS256 JWTs, extracts the caller, and guards user and admin routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Session Verification
//!
//! Login, signup and OAuth live in the session library that fronts this
//! server. It signs HS256 tokens with a shared secret; this module only
//! verifies them. Tokens arrive either as `Authorization: Bearer <token>`
//! or in the `session_token` cookie.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::constants::session;
use crate::email::{dispatch, templates, EmailMessage};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::server::ServerResources;

/// Role carried in the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Dashboard access
    #[default]
    User,
    /// Back office access
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case(session::ADMIN_ROLE) {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Whether the role grants back office access
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Claims signed by the session library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Stable user identifier
    pub sub: String,
    /// Email address of the account
    pub email: String,
    /// Display name, when the account has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `user` or `admin`
    #[serde(default)]
    pub role: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Audience
    pub aud: String,
}

/// The verified caller of a request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stable user identifier
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Role
    pub role: UserRole,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            role: UserRole::parse(&claims.role),
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Verifies (and for tooling, issues) session tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
}

impl AuthManager {
    /// Create a manager for the shared secret and expected audience
    #[must_use]
    pub fn new(secret: &str, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
        }
    }

    /// Validate a session token and return the caller
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for bad
    /// signatures, wrong audiences or malformed tokens
    pub fn validate_token(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_expired(),
                ErrorKind::InvalidSignature => AppError::auth_invalid("Token signature is invalid"),
                ErrorKind::InvalidAudience => AppError::auth_invalid("Token audience is invalid"),
                _ => AppError::auth_invalid(format!("Token is malformed: {e}")),
            }
        })?;

        if data.claims.sub.is_empty() || data.claims.email.is_empty() {
            return Err(AppError::auth_invalid("Token is missing subject or email"));
        }

        Ok(data.claims.into())
    }

    /// Sign a token the way the session library does
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails
    pub fn issue_token(&self, user: &AuthenticatedUser, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no token is present, otherwise the
    /// validation error of [`Self::validate_token`]
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        let token = bearer_token(headers)
            .or_else(|| get_cookie_value(headers, session::COOKIE_NAME))
            .ok_or_else(AppError::auth_required)?;
        self.validate_token(&token)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

/// Extract a cookie value by name
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

/// Verify the session and create the local user row on first sight
///
/// Takes the headers and path rather than the request so the guard futures stay `Send`.
async fn authenticate_and_sync(
    resources: &ServerResources,
    headers: &HeaderMap,
    path: &str,
) -> AppResult<AuthenticatedUser> {
    let user = resources
        .auth
        .authenticate(headers)
        .inspect_err(|e| AppLogger::log_auth_failure(&e.message, path))?;
    if resources.database.users().upsert_from_session(&user).await? {
        let mail = &resources.config.mail;
        let message = EmailMessage::new(
            &mail.from_address,
            &user.email,
            templates::welcome(user.name.as_deref(), &mail.app_base_url),
        );
        if let Err(e) = dispatch(resources.email.as_ref(), &message).await {
            tracing::warn!(user.id = %user.user_id, error = %e, "Welcome email failed");
        }
    }
    Ok(user)
}

/// Middleware for dashboard routes: requires any valid session
///
/// # Errors
///
/// Returns 401 when the session is missing, invalid or expired
pub async fn require_user(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user =
        authenticate_and_sync(&resources, request.headers(), request.uri().path()).await?;
    tracing::debug!(user.id = %user.user_id, "Session verified");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware for back office routes: requires the admin role
///
/// # Errors
///
/// Returns 401 without a valid session and 403 for non-admin callers
pub async fn require_admin(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user =
        authenticate_and_sync(&resources, request.headers(), request.uri().path()).await?;
    if !user.role.is_admin() {
        AppLogger::log_auth_failure("admin role required", request.uri().path());
        return Err(AppError::permission_denied("Admin privileges required"));
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-session-secret";

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "user-1".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
            role,
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let auth = AuthManager::new(SECRET, "fithub");
        let token = auth.issue_token(&user(UserRole::Admin), Duration::hours(1)).unwrap();
        let verified = auth.validate_token(&token).unwrap();
        assert_eq!(verified, user(UserRole::Admin));
    }

    #[test]
    fn test_expired_token() {
        let auth = AuthManager::new(SECRET, "fithub");
        let token = auth.issue_token(&user(UserRole::User), Duration::hours(-2)).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthExpired);
    }

    #[test]
    fn test_wrong_secret_and_audience() {
        let issuer = AuthManager::new("another-session-secret", "fithub");
        let token = issuer.issue_token(&user(UserRole::User), Duration::hours(1)).unwrap();
        let err = AuthManager::new(SECRET, "fithub").validate_token(&token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);

        let issuer = AuthManager::new(SECRET, "other-app");
        let token = issuer.issue_token(&user(UserRole::User), Duration::hours(1)).unwrap();
        let err = AuthManager::new(SECRET, "fithub").validate_token(&token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_authenticate_from_cookie_or_header() {
        let auth = AuthManager::new(SECRET, "fithub");
        let token = auth.issue_token(&user(UserRole::User), Duration::hours(1)).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(
            auth.authenticate(&headers).unwrap_err().code,
            crate::errors::ErrorCode::AuthRequired
        );

        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session_token={token}")).unwrap(),
        );
        assert_eq!(auth.authenticate(&headers).unwrap().user_id, "user-1");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(auth.authenticate(&headers).unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::parse("member"), UserRole::User);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_session_sync_is_send_and_welcomes_once() {
        use crate::config::ServerConfig;
        use crate::database::Database;
        use crate::email::MemoryEmailSender;

        let database = Database::new("sqlite::memory:").await.unwrap();
        let mail = Arc::new(MemoryEmailSender::new());
        let resources = ServerResources::new(
            database,
            Arc::new(ServerConfig::for_testing(SECRET)),
            mail.clone(),
        );
        let token = resources
            .auth
            .issue_token(&user(UserRole::User), Duration::hours(1))
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let first = authenticate_and_sync(&resources, &headers, "/api/dashboard");
        assert_send(&first);
        assert_eq!(first.await.unwrap().user_id, "user-1");
        authenticate_and_sync(&resources, &headers, "/api/dashboard")
            .await
            .unwrap();
        assert_eq!(mail.sent().await.len(), 1);

        let err = authenticate_and_sync(&resources, &HeaderMap::new(), "/api/dashboard")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthRequired);
    }
}
