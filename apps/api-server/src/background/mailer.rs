//! Outgoing mail runs on the job queue, after the request has returned.

use scribe_core::domain::mask_email;
use scribe_core::ports::{Email, JobQueue, JobQueueError};
use scribe_infra::jobs::{email_job, email_job_handler};

use crate::state::AppState;

/// Start queue workers delivering `send_email` jobs through the state's mailer.
pub async fn start_mail_worker(state: &AppState) -> Result<(), JobQueueError> {
    state
        .jobs
        .start_worker(email_job_handler(state.mailer.clone()))
        .await?;
    tracing::info!("Mail worker started");
    Ok(())
}

/// Queue an email. Failures are logged and never reach the caller.
pub async fn queue_email(jobs: &dyn JobQueue, email: Email) {
    let result = match email_job(&email) {
        Ok(job) => jobs.enqueue(job).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::warn!(
            to = %mask_email(&email.to),
            subject = %email.subject,
            error = %e,
            "Failed to queue email"
        );
    }
}
