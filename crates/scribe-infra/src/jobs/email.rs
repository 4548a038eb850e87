//! Background email delivery through the job queue.

use std::sync::Arc;

use scribe_core::ports::{Email, Job, JobFuture, JobQueueError, JobResult, Mailer};

/// Job type for outgoing emails.
pub const SEND_EMAIL_JOB: &str = "send_email";

/// Wrap an email into a queue job.
pub fn email_job(email: &Email) -> Result<Job, JobQueueError> {
    Ok(Job::typed(SEND_EMAIL_JOB, email)?.with_max_attempts(5))
}

/// Build a job handler that delivers `send_email` jobs through `mailer`.
///
/// Transient transport failures are retried; rejected messages, unknown job
/// types and undecodable payloads fail permanently.
pub fn email_job_handler(mailer: Arc<dyn Mailer>) -> Box<dyn Fn(Job) -> JobFuture + Send + Sync> {
    Box::new(move |job: Job| -> JobFuture {
        let mailer = mailer.clone();
        Box::pin(async move {
            if job.job_type != SEND_EMAIL_JOB {
                return JobResult::Failed(format!("unknown job type: {}", job.job_type));
            }

            let email: Email = match job.payload_as() {
                Ok(email) => email,
                Err(e) => return JobResult::Failed(format!("invalid email payload: {}", e)),
            };

            match mailer.send(&email).await {
                Ok(()) => JobResult::Success,
                Err(e) if e.is_transient() => JobResult::Retry(e.to_string()),
                Err(e) => JobResult::Failed(e.to_string()),
            }
        })
    })
}
