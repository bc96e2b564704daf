// ABOUTME: Conversion from sqlx errors into AppError
// ABOUTME: Maps missing rows and constraint violations onto client-facing error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use super::{AppError, ErrorCode};

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        let app_error = match &error {
            sqlx::Error::RowNotFound => Self::new(ErrorCode::ResourceNotFound, "Record not found"),
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => Self::new(
                ErrorCode::ResourceAlreadyExists,
                format!("Duplicate value: {}", db_error.message()),
            ),
            sqlx::Error::Database(db_error) if db_error.is_foreign_key_violation() => Self::new(
                ErrorCode::InvalidInput,
                format!("Referenced record does not exist: {}", db_error.message()),
            ),
            _ => Self::new(
                ErrorCode::DatabaseError,
                format!("Database operation failed: {error}"),
            ),
        };
        app_error.with_source(error)
    }
}
