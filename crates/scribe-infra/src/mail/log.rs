//! Development mailer that writes messages to the log instead of sending them.

use async_trait::async_trait;

use scribe_core::domain::mask_email;
use scribe_core::ports::{Email, MailError, Mailer};

#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(
            to = %mask_email(&email.to),
            subject = %email.subject,
            body_len = email.body.len(),
            "Email delivered to log (no mail API configured)"
        );
        Ok(())
    }
}
