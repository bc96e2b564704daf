// ABOUTME: Outbound email abstraction with a logging sender for deployments and a memory sender for tests
// ABOUTME: Routes and the achievement engine hand rendered templates to whichever sender the server holds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Email
//!
//! [`EmailSender`] is the seam to a mail provider. The server ships with
//! [`LogEmailSender`], which records every message through `tracing`;
//! tests use [`MemoryEmailSender`] to inspect what was sent.

/// Template rendering
pub mod templates;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use templates::RenderedEmail;

/// A message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Template identifier
    pub template: &'static str,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body
    pub html_body: String,
}

impl EmailMessage {
    /// Address a rendered template
    #[must_use]
    pub fn new(from: &str, to: &str, rendered: RenderedEmail) -> Self {
        Self {
            from: from.to_owned(),
            to: to.to_owned(),
            template: rendered.template,
            subject: rendered.subject,
            text_body: rendered.text,
            html_body: rendered.html,
        }
    }
}

/// Delivers email messages
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one message
    ///
    /// # Errors
    ///
    /// Returns an error when the message could not be handed off
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Send a message and record the outcome
///
/// # Errors
///
/// Returns the sender's error
pub async fn dispatch(sender: &dyn EmailSender, message: &EmailMessage) -> AppResult<()> {
    let result = sender.send(message).await;
    AppLogger::log_email_dispatched(message.template, &message.to, result.is_ok());
    result
}

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        info!(
            email.from = %message.from,
            email.to = %message.to,
            email.subject = %message.subject,
            email.body = %message.text_body,
            "Outbound email"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory
#[derive(Debug, Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl MemoryEmailSender {
    /// Empty outbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Most recent message to `to`
    pub async fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(to))
            .cloned()
    }

    /// Make subsequent sends fail
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if *self.failing.lock().await {
            return Err(AppError::internal("Mail transport unavailable"));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
