//! Redis job queue implementation using LIST operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use scribe_core::ports::{Job, JobFuture, JobQueue, JobQueueError, JobResult, QueueStats};

/// Redis job queue configuration.
#[derive(Debug, Clone)]
pub struct RedisJobQueueConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Queue name, used as the key prefix.
    pub queue_name: String,
    /// Number of worker consumers.
    pub workers: usize,
    /// Timeout for blocking pop (seconds).
    pub pop_timeout: u64,
    /// Base delay before a retried job is pushed back, multiplied by its attempts.
    pub retry_backoff: Duration,
}

impl Default for RedisJobQueueConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            queue_name: "scribe:jobs".to_string(),
            workers: 2,
            pop_timeout: 5,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default)]
struct JobStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Redis-backed job queue. Jobs survive a server restart.
pub struct RedisJobQueue {
    client: Client,
    /// Shared by enqueue and retries. Workers block on their own connections.
    conn: ConnectionManager,
    config: RedisJobQueueConfig,
    stats: Arc<JobStats>,
    running: Arc<AtomicBool>,
}

impl RedisJobQueue {
    pub async fn new(config: RedisJobQueueConfig) -> Result<Self, JobQueueError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| JobQueueError::Backend(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = Self::connect(&client, config.connect_timeout).await?;

        tracing::info!(
            queue = %config.queue_name,
            workers = config.workers,
            "Connected to Redis job queue"
        );

        Ok(Self {
            client,
            conn,
            config,
            stats: Arc::new(JobStats::default()),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn connect(
        client: &Client,
        connect_timeout: Duration,
    ) -> Result<ConnectionManager, JobQueueError> {
        // Use timeout to prevent hanging if Redis is unreachable
        tokio::time::timeout(connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| JobQueueError::Backend("Connection timed out".to_string()))?
            .map_err(|e| JobQueueError::Backend(e.to_string()))
    }

    /// Ask workers to exit after their current pop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    fn pending_key(&self) -> String {
        format!("{}:pending", self.config.queue_name)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        let mut conn = self.conn.clone();
        let job_json =
            serde_json::to_string(&job).map_err(|e| JobQueueError::EnqueueError(e.to_string()))?;

        conn.rpush::<_, _, ()>(&self.pending_key(), &job_json)
            .await
            .map_err(|e| JobQueueError::Backend(e.to_string()))?;

        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(job_id = %job.id, job_type = %job.job_type, "Job enqueued");

        Ok(())
    }

    async fn start_worker(
        &self,
        handler: Box<dyn Fn(Job) -> JobFuture + Send + Sync>,
    ) -> Result<(), JobQueueError> {
        self.running.store(true, Ordering::Relaxed);
        let handler: Arc<dyn Fn(Job) -> JobFuture + Send + Sync> = Arc::from(handler);

        for worker_id in 0..self.config.workers {
            // BLPOP parks the connection, so each worker gets its own.
            let mut conn = Self::connect(&self.client, self.config.connect_timeout).await?;
            let requeue_conn = self.conn.clone();
            let pending_key = self.pending_key();
            let stats = self.stats.clone();
            let running = self.running.clone();
            let handler = handler.clone();
            let pop_timeout = self.config.pop_timeout;
            let backoff = self.config.retry_backoff;

            tokio::spawn(async move {
                tracing::info!(worker = worker_id, queue = %pending_key, "Job queue worker started");

                while running.load(Ordering::Relaxed) {
                    let result: Result<Option<(String, String)>, _> =
                        conn.blpop(&pending_key, pop_timeout as f64).await;

                    let job_json = match result {
                        Ok(Some((_, json))) => json,
                        Ok(None) => continue, // Timeout, loop again
                        Err(e) => {
                            tracing::error!(error = %e, "Redis BLPOP error");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                            continue;
                        }
                    };

                    // Jobs left over from a previous process were never counted here.
                    let _ = stats
                        .pending
                        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));

                    let mut job: Job = match serde_json::from_str(&job_json) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to deserialize job");
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                    };

                    stats.processing.fetch_add(1, Ordering::Relaxed);
                    job.attempts += 1;

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        attempt = job.attempts,
                        "Processing job"
                    );

                    let result = handler(job.clone()).await;
                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) if job.can_retry() => {
                            let delay = job.retry_delay(backoff);
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                delay_ms = delay.as_millis() as u64,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            stats.pending.fetch_add(1, Ordering::Relaxed);

                            let mut requeue_conn = requeue_conn.clone();
                            let pending_key = pending_key.clone();
                            let stats = stats.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                let requeued = match serde_json::to_string(&job) {
                                    Ok(json) => requeue_conn
                                        .rpush::<_, _, ()>(&pending_key, &json)
                                        .await
                                        .map_err(|e| e.to_string()),
                                    Err(e) => Err(e.to_string()),
                                };
                                if let Err(e) = requeued {
                                    let _ = stats.pending.fetch_update(
                                        Ordering::Relaxed,
                                        Ordering::Relaxed,
                                        |n| n.checked_sub(1),
                                    );
                                    stats.failed.fetch_add(1, Ordering::Relaxed);
                                    tracing::error!(job_id = %job.id, error = %e, "Failed to re-enqueue job for retry");
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed after max retries");
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed");
                        }
                    }
                }

                tracing::info!(worker = worker_id, "Worker stopping");
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
