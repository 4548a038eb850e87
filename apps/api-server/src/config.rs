//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and handed to constructors; nothing
//! below `main` looks at the environment again.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use scribe_infra::auth::{DEFAULT_JWT_SECRET, JwtConfig};
use scribe_infra::jobs::InMemoryJobQueueConfig;
use scribe_infra::rate_limit::RateLimitConfig;

/// Upload limits for profile pictures.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// Mail API settings. Without them, mail goes to the log.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Job queue settings.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: Option<String>,
    pub name: String,
    pub workers: usize,
    pub max_size: usize,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub mail: Option<MailConfig>,
    pub queue: QueueConfig,
    pub rate_limit: RateLimitConfig,
}

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let production = env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            expiration_minutes: parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "scribe-api".to_string()),
        };

        if jwt.uses_default_secret() {
            if production {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }
        if jwt.expiration_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: jwt.expiration_minutes.to_string(),
            });
        }

        let mail = match (env::var("MAIL_API_URL"), env::var("MAIL_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => Some(MailConfig {
                api_url,
                api_key,
                from: env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@scribe.local".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080)?,
            production,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_or("DB_MIN_CONNECTIONS", 2)?,
            jwt,
            upload: UploadConfig {
                dir: PathBuf::from(
                    env::var("UPLOAD_DIR").unwrap_or_else(|_| "media/profile_pics".to_string()),
                ),
                max_bytes: parse_or("UPLOAD_MAX_BYTES", 5 * 1024 * 1024)?,
            },
            mail,
            queue: QueueConfig {
                redis_url: env::var("REDIS_URL").ok(),
                name: env::var("JOB_QUEUE_NAME").unwrap_or_else(|_| "scribe:jobs".to_string()),
                workers: parse_or("JOB_QUEUE_WORKERS", 2)?,
                max_size: parse_or("JOB_QUEUE_MAX_SIZE", 1000)?,
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 10)?,
                window: Duration::from_secs(parse_or("RATE_LIMIT_WINDOW_SECS", 60)?),
            },
        })
    }

    pub fn in_memory_queue(&self) -> InMemoryJobQueueConfig {
        InMemoryJobQueueConfig {
            max_size: self.queue.max_size,
            workers: self.queue.workers,
            ..InMemoryJobQueueConfig::default()
        }
    }
}
