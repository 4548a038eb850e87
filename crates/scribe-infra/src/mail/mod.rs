//! Mail transports.

mod log;

pub use self::log::LogMailer;

#[cfg(feature = "mail")]
mod http;
#[cfg(feature = "mail")]
pub use self::http::{HttpMailer, HttpMailerConfig};
