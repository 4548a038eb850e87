//! Mailer that posts messages to a JSON mail API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use scribe_core::domain::mask_email;
use scribe_core::ports::{Email, MailError, Mailer};

/// Mail API configuration.
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Endpoint accepting `POST` with a JSON message.
    pub api_url: String,
    /// Sent as a bearer token.
    pub api_key: String,
    pub from: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// JSON-over-HTTP mailer.
pub struct HttpMailer {
    client: reqwest::Client,
    config: HttpMailerConfig,
}

impl HttpMailer {
    pub fn new(config: HttpMailerConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

/// Server-side and throttling failures are transient; other 4xx are rejections.
fn classify_status(status: StatusCode, body: String) -> Result<(), MailError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(MailError::Transport(format!("{}: {}", status, body)))
    } else {
        Err(MailError::Rejected(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = OutgoingMessage {
            from: &self.config.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_status(status, body)?;

        tracing::info!(to = %mask_email(&email.to), subject = %email.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::ACCEPTED, String::new()).is_ok());

        let err = classify_status(StatusCode::BAD_GATEWAY, "down".into()).unwrap_err();
        assert!(err.is_transient());

        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).unwrap_err();
        assert!(err.is_transient());

        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad to".into()).unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transient() {
        let mailer = HttpMailer::new(HttpMailerConfig {
            api_url: "http://127.0.0.1:9/send".to_string(),
            api_key: "key".to_string(),
            from: "noreply@example.com".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();

        let err = mailer
            .send(&Email::welcome("alice@example.com", "alice"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
