//! First-run and restart announcements.
//!
//! On every boot the bot checks whether it has ever introduced itself. The
//! very first boot sends a welcome and records it; later boots stay quiet
//! unless `RESTART_MESSAGE` asks for a restart notice.

use async_trait::async_trait;

use herald_notifier::Dispatcher;
use herald_store::ResilientStore;
use herald_store::error::Result;

pub const WELCOME_MESSAGE: &str = "Hi there! It looks like this is the first time I am being started!  I can tell you about transactions that have happened, weekly matchup data, and score updates.";

pub const RESTART_MESSAGE: &str =
    "Hi there! It looks like I was just restarted.  You may get data from earlier times.";

/// Persistent record of whether the welcome message went out.
#[async_trait]
pub trait NoticeLedger: Send + Sync {
    async fn was_startup_notice_sent(&self) -> Result<bool>;
    async fn mark_startup_notice_sent(&self) -> Result<()>;
}

#[async_trait]
impl NoticeLedger for ResilientStore {
    async fn was_startup_notice_sent(&self) -> Result<bool> {
        ResilientStore::was_startup_notice_sent(self).await
    }

    async fn mark_startup_notice_sent(&self) -> Result<()> {
        ResilientStore::mark_startup_notice_sent(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Unchecked,
    /// Welcome sent and recorded.
    FirstRun,
    /// Restart notice sent.
    Restart,
    /// Nothing to announce.
    Silent,
}

pub struct StartupCoordinator<'a, L: NoticeLedger> {
    ledger: &'a L,
    dispatcher: &'a Dispatcher,
    restart_message: bool,
    state: StartupState,
}

impl<'a, L: NoticeLedger> StartupCoordinator<'a, L> {
    pub fn new(ledger: &'a L, dispatcher: &'a Dispatcher, restart_message: bool) -> Self {
        Self {
            ledger,
            dispatcher,
            restart_message,
            state: StartupState::Unchecked,
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Decide and send the startup announcement. Only the first call does
    /// any work; later calls return the state it settled on.
    pub async fn run(&mut self) -> Result<StartupState> {
        if self.state != StartupState::Unchecked {
            return Ok(self.state);
        }

        let state = if !self.ledger.was_startup_notice_sent().await? {
            self.dispatcher.send(WELCOME_MESSAGE).await;
            self.ledger.mark_startup_notice_sent().await?;
            StartupState::FirstRun
        } else if self.restart_message {
            self.dispatcher.send(RESTART_MESSAGE).await;
            StartupState::Restart
        } else {
            StartupState::Silent
        };

        tracing::info!(?state, "Startup check complete");
        self.state = state;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use herald_notifier::Channel;
    use herald_notifier::platforms::Discord;
    use herald_store::StoreError;

    use super::*;

    #[derive(Default)]
    struct MemoryLedger {
        sent: AtomicBool,
        reads: AtomicUsize,
        fail: bool,
    }

    impl MemoryLedger {
        fn already_sent() -> Self {
            Self {
                sent: AtomicBool::new(true),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl NoticeLedger for MemoryLedger {
        async fn was_startup_notice_sent(&self) -> Result<bool> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::ConnectionExhausted {
                    attempts: 100,
                    source: sqlx::Error::PoolTimedOut,
                });
            }
            Ok(self.sent.load(Ordering::SeqCst))
        }

        async fn mark_startup_notice_sent(&self) -> Result<()> {
            self.sent.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn dispatcher_at(server: &Server) -> Dispatcher {
        let channel = Channel::new(
            Discord::new(2000),
            format!("{}/discord", server.url()),
            reqwest::Client::new(),
        );
        channel.set_active(true);
        Dispatcher::new(vec![channel])
    }

    #[tokio::test]
    async fn test_first_run_sends_welcome_and_records_it() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/discord")
            .match_body(Matcher::Json(json!({"content": WELCOME_MESSAGE})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let dispatcher = dispatcher_at(&server).await;
        let ledger = MemoryLedger::default();

        let mut coordinator = StartupCoordinator::new(&ledger, &dispatcher, true);
        assert_eq!(coordinator.state(), StartupState::Unchecked);
        assert_eq!(coordinator.run().await.unwrap(), StartupState::FirstRun);
        assert!(ledger.sent.load(Ordering::SeqCst));

        dispatcher.shutdown(Duration::from_secs(10)).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_restart_notice_when_enabled() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/discord")
            .match_body(Matcher::Json(json!({"content": RESTART_MESSAGE})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let dispatcher = dispatcher_at(&server).await;
        let ledger = MemoryLedger::already_sent();

        let mut coordinator = StartupCoordinator::new(&ledger, &dispatcher, true);
        assert_eq!(coordinator.run().await.unwrap(), StartupState::Restart);

        dispatcher.shutdown(Duration::from_secs(10)).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_silent_restart_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/discord").expect(0).create_async().await;
        let dispatcher = dispatcher_at(&server).await;
        let ledger = MemoryLedger::already_sent();

        let mut coordinator = StartupCoordinator::new(&ledger, &dispatcher, false);
        assert_eq!(coordinator.run().await.unwrap(), StartupState::Silent);

        dispatcher.shutdown(Duration::from_secs(10)).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_run_does_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/discord")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let dispatcher = dispatcher_at(&server).await;
        let ledger = MemoryLedger::default();

        let mut coordinator = StartupCoordinator::new(&ledger, &dispatcher, true);
        assert_eq!(coordinator.run().await.unwrap(), StartupState::FirstRun);
        assert_eq!(coordinator.run().await.unwrap(), StartupState::FirstRun);
        assert_eq!(ledger.reads.load(Ordering::SeqCst), 1);

        dispatcher.shutdown(Duration::from_secs(10)).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ledger_failure_leaves_state_unchecked() {
        let server = Server::new_async().await;
        let dispatcher = dispatcher_at(&server).await;
        let ledger = MemoryLedger {
            fail: true,
            ..Default::default()
        };

        let mut coordinator = StartupCoordinator::new(&ledger, &dispatcher, true);
        let err = coordinator.run().await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(coordinator.state(), StartupState::Unchecked);
        dispatcher.shutdown(Duration::from_secs(1)).await;
    }
}
