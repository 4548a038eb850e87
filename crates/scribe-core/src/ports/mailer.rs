//! Outgoing email port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A plain-text email message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// Welcome message sent after registration.
    pub fn welcome(to: &str, username: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome to Scribe".to_string(),
            body: format!(
                "Hi {},\n\nyour account is ready. Log in and write your first post!\n",
                username
            ),
        }
    }

    /// Notice sent after a password change.
    pub fn password_changed(to: &str, username: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your Scribe password was changed".to_string(),
            body: format!(
                "Hi {},\n\nthe password for your account was just changed. \
                 If this was not you, contact support.\n",
                username
            ),
        }
    }
}

/// Mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Mail delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Network or server trouble - worth retrying.
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// The provider refused the message.
    #[error("Mail rejected: {0}")]
    Rejected(String),
}

impl MailError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
