//! Notification fan-out to chat webhooks.
//!
//! A [`Dispatcher`] owns one [`Channel`] per configured chat platform and
//! delivers every message to all active channels concurrently. Messages are
//! corrected and cut into platform-sized chunks by [`message`] before they
//! leave the process.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod platforms;

pub use channel::{Channel, DeliveryReport, Platform};
pub use dispatcher::Dispatcher;
pub use error::NotifyError;
