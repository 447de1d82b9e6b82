//! # Account Mail
//!
//! Messages the auth flows send to users. Delivery is pluggable; the
//! default sender writes each message to the log so a development server
//! works without an SMTP relay.

use std::sync::{Mutex, PoisonError};

use super::errors::AuthResult;

/// Messages sent to users of auth-enabled collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Carries the raw one-time token for the reset form
    PasswordReset {
        collection: String,
        email: String,
        token: String,
    },

    PasswordChanged { collection: String, email: String },
}

impl EmailTemplate {
    pub fn recipient(&self) -> &str {
        match self {
            EmailTemplate::PasswordReset { email, .. } => email,
            EmailTemplate::PasswordChanged { email, .. } => email,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::PasswordReset { .. } => "Reset your password",
            EmailTemplate::PasswordChanged { .. } => "Your password was changed",
        }
    }
}

/// Delivery seam for account mail
pub trait EmailSender: Send + Sync {
    fn send(&self, message: EmailTemplate) -> AuthResult<()>;
}

/// Writes messages to the tracing log instead of delivering them
#[derive(Debug, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: EmailTemplate) -> AuthResult<()> {
        match &message {
            EmailTemplate::PasswordReset {
                collection, token, ..
            } => tracing::info!(
                to = message.recipient(),
                collection = %collection,
                token = %token,
                "{}",
                message.subject()
            ),
            EmailTemplate::PasswordChanged { collection, .. } => tracing::info!(
                to = message.recipient(),
                collection = %collection,
                "{}",
                message.subject()
            ),
        }
        Ok(())
    }
}

/// Keeps every message in memory for inspection
#[derive(Debug, Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<EmailTemplate>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailTemplate> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Token from the most recent reset message
    pub fn last_reset_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|m| match m {
            EmailTemplate::PasswordReset { token, .. } => Some(token),
            _ => None,
        })
    }
}

impl EmailSender for MockEmailSender {
    fn send(&self, message: EmailTemplate) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}
