// ABOUTME: Single-use email tokens for address verification and password reset links
// ABOUTME: Stores only SHA-256 hashes and consumes tokens atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};

use super::{new_id, now_timestamp, to_db_timestamp, Database};
use crate::errors::{AppError, AppResult};

/// What an emailed token authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTokenPurpose {
    /// Confirms ownership of the address
    VerifyEmail,
    /// Authorizes a password reset in the session library
    PasswordReset,
}

impl EmailTokenPurpose {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "verify_email",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// A freshly issued token; `token` is only ever held in memory and in the email
#[derive(Debug, Clone)]
pub struct IssuedEmailToken {
    /// Row identifier
    pub id: String,
    /// Plaintext token to embed in the link
    pub token: String,
}

impl Database {
    pub(super) async fn migrate_email_tokens(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS email_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                purpose TEXT NOT NULL CHECK (purpose IN ('verify_email', 'password_reset')),
                token_hash TEXT NOT NULL UNIQUE,
                expires_at TEXT NOT NULL,
                consumed_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_email_tokens_user ON email_tokens(user_id, purpose)",
        ])
        .await
    }
}

/// Email token database operations
pub struct EmailTokensManager {
    pool: SqlitePool,
}

impl EmailTokensManager {
    /// Create a new email tokens manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate 32 random bytes, URL-safe base64 encoded
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Issue a token, retiring any earlier unconsumed token of the same purpose
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn issue(
        &self,
        user_id: &str,
        purpose: EmailTokenPurpose,
        ttl: Duration,
    ) -> AppResult<IssuedEmailToken> {
        let token = Self::generate_token();
        let id = new_id();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            UPDATE email_tokens SET consumed_at = $1
            WHERE user_id = $2 AND purpose = $3 AND consumed_at IS NULL
            ",
        )
        .bind(to_db_timestamp(now))
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO email_tokens (id, user_id, purpose, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(purpose.as_str())
        .bind(Self::hash_token(&token))
        .bind(to_db_timestamp(now + ttl))
        .bind(to_db_timestamp(now))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(IssuedEmailToken { id, token })
    }

    /// Consume a token and return its user id
    ///
    /// The check and the consumption are one statement, so a token can be
    /// redeemed at most once.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` when the token is unknown, expired, already
    /// consumed or issued for another purpose
    pub async fn consume(&self, token: &str, purpose: EmailTokenPurpose) -> AppResult<String> {
        let now = now_timestamp();
        let row = sqlx::query(
            r"
            UPDATE email_tokens SET consumed_at = $1
            WHERE token_hash = $2 AND purpose = $3
              AND consumed_at IS NULL AND expires_at > $1
            RETURNING user_id
            ",
        )
        .bind(&now)
        .bind(Self::hash_token(token.trim()))
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.get::<String, _>("user_id"))
            .ok_or_else(|| AppError::auth_invalid("Token is invalid or has expired"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let a = EmailTokensManager::generate_token();
        let b = EmailTokensManager::generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        let hash = EmailTokensManager::hash_token(&a);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, a);
    }
}
