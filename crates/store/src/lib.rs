//! Durable state for the herald bot.
//!
//! [`ResilientStore`] keeps three append-only logs in PostgreSQL: OAuth
//! credentials, polling checkpoints and the startup-notice flag. Each log is
//! capped at [`retention::RETAINED_ROWS`] rows. Connecting is retried under a
//! [`RetryPolicy`]; running out of attempts is a fatal [`StoreError`].

pub mod error;
pub mod retention;
pub mod retry;
pub mod store;

pub use error::StoreError;
pub use retention::RetainedTable;
pub use retry::RetryPolicy;
pub use store::ResilientStore;
