//! Job queue implementations and job handlers.

mod email;
mod memory;

pub use email::{SEND_EMAIL_JOB, email_job, email_job_handler};
pub use memory::{InMemoryJobQueue, InMemoryJobQueueConfig};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisJobQueue, RedisJobQueueConfig};
