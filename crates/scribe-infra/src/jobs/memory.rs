//! In-memory job queue implementation.
//!
//! This is the fallback when Redis is not available.
//! Jobs are stored in memory and processed by local workers.
//! Note: Jobs are lost on server restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use scribe_core::ports::{Job, JobFuture, JobQueue, JobQueueError, JobResult, QueueStats};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of pending jobs.
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
    /// Base delay before a retry, multiplied by the attempt number.
    pub retry_backoff: Duration,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            workers: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Default)]
struct JobStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// In-memory job queue backed by a bounded mpsc channel.
pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(1));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
        }
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new(InMemoryJobQueueConfig::default())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        // Never block the caller: a full queue is reported, not waited on.
        self.job_sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => JobQueueError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => {
                JobQueueError::EnqueueError("queue closed".to_string())
            }
        })?;

        let pending = self.stats.pending.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(pending, "Job enqueued");

        Ok(())
    }

    async fn start_worker(
        &self,
        handler: Box<dyn Fn(Job) -> JobFuture + Send + Sync>,
    ) -> Result<(), JobQueueError> {
        let handler: Arc<dyn Fn(Job) -> JobFuture + Send + Sync> = Arc::from(handler);

        for worker_id in 0..self.config.workers {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let stats = self.stats.clone();
            let sender = self.job_sender.clone();
            let backoff = self.config.retry_backoff;

            tokio::spawn(async move {
                tracing::info!(worker = worker_id, "Job worker started");

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!(worker = worker_id, "Job worker shutting down");
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Processing job"
                    );

                    job.attempts += 1;
                    let result = handler(job.clone()).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) if job.can_retry() => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                max_attempts = job.max_attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            stats.pending.fetch_add(1, Ordering::Relaxed);

                            let sender = sender.clone();
                            let stats = stats.clone();
                            let delay = job.retry_delay(backoff);
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                if let Err(e) = sender.send(job).await {
                                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                                    stats.failed.fetch_add(1, Ordering::Relaxed);
                                    tracing::error!("Failed to re-enqueue job for retry: {}", e);
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}
