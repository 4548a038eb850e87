//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod mailer;
mod rate_limit;
mod repository;
mod storage;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService, bearer_token};
pub use job_queue::{Job, JobFuture, JobQueue, JobQueueError, JobResult, QueueStats};
pub use mailer::{Email, MailError, Mailer};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, PostRepository, UserRepository};
pub use storage::{FileStorage, StorageError, validate_file_name};
