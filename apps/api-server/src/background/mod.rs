//! Background processing.

mod mailer;

pub use mailer::{queue_email, start_mail_worker};
