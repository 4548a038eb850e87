//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::ports::{
    FileStorage, JobQueue, Mailer, PasswordService, PostRepository, RateLimiter, TokenService,
    UserRepository,
};
use scribe_infra::auth::{Argon2PasswordService, JwtTokenService};
use scribe_infra::jobs::InMemoryJobQueue;
use scribe_infra::rate_limit::InMemoryRateLimiter;
use scribe_infra::{InMemoryStore, LocalFileStorage, LogMailer};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub passwords: Arc<dyn PasswordService>,
    pub tokens: Arc<dyn TokenService>,
    pub storage: Arc<dyn FileStorage>,
    pub jobs: Arc<dyn JobQueue>,
    pub mailer: Arc<dyn Mailer>,
    pub login_limiter: Arc<dyn RateLimiter>,
    pub upload_max_bytes: usize,
}

type Repositories = (Arc<dyn UserRepository>, Arc<dyn PostRepository>);

fn in_memory_repositories() -> Repositories {
    let store = InMemoryStore::new();
    (Arc::new(store.users()), Arc::new(store.posts()))
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Optional backends (Postgres, Redis, the mail API) fall back to
    /// in-memory or logging implementations when unconfigured.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (users, posts) = Self::repositories(config).await;

        let storage = LocalFileStorage::new(config.upload.dir.clone()).await?;

        let login_limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())?);
        // Idle clients are back at full quota after one window.
        login_limiter.spawn_pruner(config.rate_limit.window);

        let state = Self {
            users,
            posts,
            passwords: Arc::new(Argon2PasswordService::new()),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            storage: Arc::new(storage),
            jobs: Self::job_queue(config).await,
            mailer: Self::mailer(config)?,
            login_limiter,
            upload_max_bytes: config.upload.max_bytes,
        };

        tracing::info!("Application state initialized");
        Ok(state)
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        use scribe_infra::database::{
            DatabaseConfig, PostgresPostRepository, PostgresUserRepository, connect,
        };

        let Some(url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return in_memory_repositories();
        };

        let db_config = DatabaseConfig {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            ..DatabaseConfig::new(url)
        };

        match connect(&db_config).await {
            Ok(conn) => (
                Arc::new(PostgresUserRepository::new(conn.clone())),
                Arc::new(PostgresPostRepository::new(conn)),
            ),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                in_memory_repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        in_memory_repositories()
    }

    #[cfg(feature = "redis")]
    async fn job_queue(config: &AppConfig) -> Arc<dyn JobQueue> {
        use scribe_infra::jobs::{RedisJobQueue, RedisJobQueueConfig};

        if let Some(url) = config.queue.redis_url.clone() {
            let redis_config = RedisJobQueueConfig {
                url,
                queue_name: config.queue.name.clone(),
                workers: config.queue.workers,
                ..RedisJobQueueConfig::default()
            };
            match RedisJobQueue::new(redis_config).await {
                Ok(queue) => return Arc::new(queue),
                Err(e) => {
                    tracing::error!("Failed to connect job queue to Redis: {}. Using in-memory queue.", e)
                }
            }
        }

        Arc::new(InMemoryJobQueue::new(config.in_memory_queue()))
    }

    #[cfg(not(feature = "redis"))]
    async fn job_queue(config: &AppConfig) -> Arc<dyn JobQueue> {
        Arc::new(InMemoryJobQueue::new(config.in_memory_queue()))
    }

    #[cfg(feature = "mail")]
    fn mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
        use scribe_infra::mail::{HttpMailer, HttpMailerConfig};

        match &config.mail {
            Some(mail) => {
                let mailer = HttpMailer::new(HttpMailerConfig {
                    api_url: mail.api_url.clone(),
                    api_key: mail.api_key.clone(),
                    from: mail.from.clone(),
                    timeout: std::time::Duration::from_secs(10),
                })?;
                tracing::info!(api_url = %mail.api_url, "Sending mail through HTTP API");
                Ok(Arc::new(mailer))
            }
            None => {
                tracing::warn!("MAIL_API_URL not set. Outgoing mail is only logged.");
                Ok(Arc::new(LogMailer))
            }
        }
    }

    #[cfg(not(feature = "mail"))]
    fn mailer(_config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
        Ok(Arc::new(LogMailer))
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use scribe_infra::auth::JwtConfig;
    use scribe_infra::jobs::InMemoryJobQueueConfig;
    use scribe_infra::rate_limit::RateLimitConfig;

    /// Fully in-memory state with cheap hashing and a throwaway upload directory.
    pub async fn in_memory_state() -> AppState {
        let (users, posts) = in_memory_repositories();
        let upload_dir = std::env::temp_dir().join(format!("scribe-test-{}", uuid::Uuid::new_v4()));

        AppState {
            users,
            posts,
            passwords: Arc::new(Argon2PasswordService::with_params(1024, 1, 1).unwrap()),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            storage: Arc::new(LocalFileStorage::new(upload_dir).await.unwrap()),
            jobs: Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig::default())),
            mailer: Arc::new(LogMailer),
            login_limiter: Arc::new(
                InMemoryRateLimiter::new(RateLimitConfig {
                    max_requests: 1000,
                    window: std::time::Duration::from_secs(60),
                })
                .unwrap(),
            ),
            upload_max_bytes: 1024,
        }
    }
}
