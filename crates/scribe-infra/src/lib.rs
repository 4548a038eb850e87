//! # Scribe Infrastructure
//!
//! Concrete implementations of the ports defined in `scribe-core`.
//! This crate contains database, queue, storage, mail and auth integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor
//! - `redis` - Redis-backed job queue
//! - `mail` - HTTP mail API client

pub mod database;
pub mod jobs;
pub mod mail;
pub mod storage;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use database::{InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use mail::LogMailer;
pub use storage::LocalFileStorage;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "redis")]
pub use jobs::{RedisJobQueue, RedisJobQueueConfig};

#[cfg(feature = "mail")]
pub use mail::{HttpMailer, HttpMailerConfig};
