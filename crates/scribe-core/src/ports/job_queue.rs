//! Job queue port - abstraction over job queue backends.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A job that can be queued and processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Job type used to route to a handler.
    pub job_type: String,
    /// Serialized payload.
    pub payload: serde_json::Value,
    /// Number of attempts made so far.
    pub attempts: u32,
    /// Maximum attempts before the job is marked failed.
    pub max_attempts: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            payload,
            attempts: 0,
            max_attempts: 3,
            created_at: chrono::Utc::now(),
        }
    }

    /// Build a job from any serializable payload.
    pub fn typed<T: Serialize>(
        job_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, JobQueueError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| JobQueueError::EnqueueError(e.to_string()))?;
        Ok(Self::new(job_type, value))
    }

    /// Decode the payload into its typed form.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Delay before the next attempt, growing linearly with attempts made.
    pub fn retry_delay(&self, backoff: Duration) -> Duration {
        backoff * self.attempts.max(1)
    }
}

/// Result of job processing.
#[derive(Debug)]
pub enum JobResult {
    Success,
    /// Transient failure, retry while attempts remain.
    Retry(String),
    /// Permanent failure.
    Failed(String),
}

/// Boxed future returned by job handlers.
pub type JobFuture = Pin<Box<dyn Future<Output = JobResult> + Send>>;

/// Job queue trait - abstraction over job queue backends.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for processing.
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Spawn workers that process jobs with the given handler.
    async fn start_worker(
        &self,
        handler: Box<dyn Fn(Job) -> JobFuture + Send + Sync>,
    ) -> Result<(), JobQueueError>;

    /// Get queue statistics.
    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Job queue errors.
#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueError(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Backend error: {0}")]
    Backend(String),
}
