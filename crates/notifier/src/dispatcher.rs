//! Fan-out of one message to every channel.
//!
//! Each channel gets a dedicated worker task for the lifetime of the
//! dispatcher. [`Dispatcher::send`] stores the text on every channel and
//! wakes its worker through a single-slot queue, so a slow or failing
//! platform only ever holds up its own worker. Wake-ups that arrive while one
//! is already queued collapse into it; the worker then delivers whatever
//! message is pending at that moment.

use std::sync::Arc;
use std::time::Duration;

use herald_common::config::{AppConfig, ChannelsConfig};
use herald_common::types::ChannelKind;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::channel::Channel;
use crate::error::Result;
use crate::platforms::{Discord, GroupMe, Slack};

struct Workers {
    wakers: Vec<mpsc::Sender<()>>,
    tasks: JoinSet<()>,
}

pub struct Dispatcher {
    channels: Vec<Arc<Channel>>,
    workers: Mutex<Option<Workers>>,
}

impl Dispatcher {
    /// Start one worker per channel. Must be called from within a Tokio runtime.
    pub fn new(channels: Vec<Channel>) -> Self {
        let channels: Vec<Arc<Channel>> = channels.into_iter().map(Arc::new).collect();

        let mut wakers = Vec::with_capacity(channels.len());
        let mut tasks = JoinSet::new();
        for channel in &channels {
            let (tx, rx) = mpsc::channel(1);
            wakers.push(tx);
            tasks.spawn(run_worker(Arc::clone(channel), rx));
        }

        tracing::debug!(workers = channels.len(), "Delivery workers started");

        Self {
            channels,
            workers: Mutex::new(Some(Workers { wakers, tasks })),
        }
    }

    /// Build the GroupMe, Discord and Slack channels from configuration and
    /// activate the ones whose settings are present.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        let settings = &config.channels;

        let channels = vec![
            Channel::new(
                GroupMe::new(
                    settings.groupme_bot_id.clone().unwrap_or_default(),
                    settings.groupme_max_message_len,
                ),
                settings.groupme_api_url.clone(),
                client.clone(),
            ),
            Channel::new(
                Discord::new(settings.discord_max_message_len),
                settings.discord_webhook_url.clone().unwrap_or_default(),
                client.clone(),
            ),
            Channel::new(
                Slack::new(settings.slack_max_message_len),
                settings.slack_webhook_url.clone().unwrap_or_default(),
                client,
            ),
        ]
        .into_iter()
        .map(|channel| channel.with_chunk_interval(config.chunk_interval()))
        .collect();

        let dispatcher = Self::new(channels);
        dispatcher.apply_activation(settings);
        Ok(dispatcher)
    }

    /// Re-check configuration and switch each channel on or off depending on
    /// whether its required settings are present.
    pub fn apply_activation(&self, settings: &ChannelsConfig) {
        for channel in &self.channels {
            let configured = match channel.kind() {
                ChannelKind::GroupMe => settings.groupme_configured(),
                ChannelKind::Discord => settings.discord_configured(),
                ChannelKind::Slack => settings.slack_configured(),
            };
            channel.set_active(configured);
            tracing::info!(
                channel = %channel.kind(),
                active = configured,
                "Channel configuration checked"
            );
        }
    }

    pub fn channels(&self) -> &[Arc<Channel>] {
        &self.channels
    }

    pub fn active_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_active()).count()
    }

    /// Broadcast `text` to every active channel.
    ///
    /// Returns as soon as every worker has been woken; delivery happens in
    /// the background and failures are only logged.
    pub async fn send(&self, text: &str) {
        let workers = self.workers.lock().await;
        let Some(workers) = workers.as_ref() else {
            tracing::warn!("Dispatcher is shut down, message dropped");
            return;
        };

        for (channel, waker) in self.channels.iter().zip(&workers.wakers) {
            channel.set_pending_message(text);
            match waker.try_send(()) {
                // Full: a wake-up is already queued and will pick up this message.
                Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
                Err(mpsc::error::TrySendError::Closed(())) => {
                    tracing::error!(
                        channel = %channel.kind(),
                        "Delivery worker is gone, message dropped"
                    );
                }
            }
        }
    }

    /// Stop accepting messages and wait up to `grace` for in-flight
    /// deliveries to finish. Workers still running afterwards are aborted.
    pub async fn shutdown(&self, grace: Duration) {
        let Some(Workers { wakers, mut tasks }) = self.workers.lock().await.take() else {
            return;
        };

        // Closing the queues lets each worker finish its queued delivery and exit.
        drop(wakers);

        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Delivery worker panicked");
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                grace_secs = grace.as_secs(),
                "Deliveries still running after grace period, aborting"
            );
            tasks.abort_all();
        } else {
            tracing::info!("All deliveries drained");
        }
    }
}

async fn run_worker(channel: Arc<Channel>, mut wake: mpsc::Receiver<()>) {
    while wake.recv().await.is_some() {
        channel.deliver().await;
    }
    tracing::debug!(channel = %channel.kind(), "Delivery worker stopped");
}
