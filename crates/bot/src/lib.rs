//! Process wiring for the herald bot: the one-shot startup announcement.

pub mod startup;

pub use startup::{NoticeLedger, StartupCoordinator, StartupState};
