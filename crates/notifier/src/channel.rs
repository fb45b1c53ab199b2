//! A single outbound notification target.
//!
//! [`Channel`] owns the state every target shares (endpoint, activation,
//! pending message) and the delivery loop. What differs per chat platform
//! is the request body and payload limit, supplied by a [`Platform`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use herald_common::types::ChannelKind;
use reqwest::Url;
use serde_json::Value;

use crate::error::{NotifyError, Result};
use crate::message;

/// Wire format of a chat platform.
pub trait Platform: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Maximum number of characters of message text per request.
    fn max_chunk_size(&self) -> usize;

    /// JSON body carrying one chunk of text.
    fn payload(&self, chunk: &str) -> Value;
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks_sent: usize,
    pub chunks_failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> bool {
        self.chunks_sent + self.chunks_failed > 0
    }
}

pub struct Channel {
    platform: Box<dyn Platform>,
    endpoint: String,
    client: reqwest::Client,
    chunk_interval: Duration,
    active: AtomicBool,
    pending: Mutex<Option<String>>,
}

impl Channel {
    /// Create an inactive channel. Configuration checks turn it on with
    /// [`Channel::set_active`] once the required settings are known to exist.
    pub fn new(
        platform: impl Platform + 'static,
        endpoint: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            platform: Box::new(platform),
            endpoint: endpoint.into(),
            client,
            chunk_interval: Duration::ZERO,
            active: AtomicBool::new(false),
            pending: Mutex::new(None),
        }
    }

    /// Pause between consecutive chunks of the same message.
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    pub fn kind(&self) -> ChannelKind {
        self.platform.kind()
    }

    pub fn max_chunk_size(&self) -> usize {
        self.platform.max_chunk_size()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Store `text` for the next delivery, replacing anything not yet sent.
    pub fn set_pending_message(&self, text: impl Into<String>) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.into());
    }

    pub fn has_pending_message(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn take_pending_message(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Send the pending message, if any, as one request per chunk.
    ///
    /// The pending message is consumed whatever happens. Failures are logged
    /// and never returned; a failed chunk does not stop later chunks.
    pub async fn deliver(&self) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let Some(message) = self.take_pending_message() else {
            return report;
        };

        if !self.is_active() {
            tracing::trace!(channel = %self.kind(), "Channel inactive, message discarded");
            return report;
        }

        let corrected = message::correct(&message);
        if corrected.is_empty() {
            tracing::debug!(channel = %self.kind(), "Empty message, nothing to deliver");
            return report;
        }

        let chunks = message::chunk(&corrected, self.max_chunk_size());
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 && !self.chunk_interval.is_zero() {
                tokio::time::sleep(self.chunk_interval).await;
            }

            match self.post(chunk).await {
                Ok(()) => report.chunks_sent += 1,
                Err(e) => {
                    tracing::error!(
                        channel = %self.kind(),
                        chunk = index + 1,
                        total,
                        error = %e,
                        "Failed to deliver message chunk"
                    );
                    report.chunks_failed += 1;
                }
            }
        }

        tracing::info!(
            channel = %self.kind(),
            sent = report.chunks_sent,
            failed = report.chunks_failed,
            "Message delivered"
        );

        report
    }

    async fn post(&self, chunk: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.platform.payload(chunk))
            .send()
            .await
            .map_err(|source| NotifyError::Http {
                channel: self.kind().to_string(),
                // Webhook URLs embed credentials
                source: source.without_url(),
            })?;

        let status = response.status();
        tracing::debug!(
            channel = %self.kind(),
            status = status.as_u16(),
            "Webhook responded"
        );

        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                channel: self.kind().to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (active: {}, endpoint: {}, max chunk: {})",
            self.kind(),
            self.is_active(),
            redact_endpoint(&self.endpoint),
            self.max_chunk_size()
        )
    }
}

/// Reduce an endpoint to scheme and host so it can be logged.
pub fn redact_endpoint(endpoint: &str) -> String {
    if endpoint.is_empty() {
        return "<unset>".to_string();
    }

    match Url::parse(endpoint) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}/***", url.scheme(), host),
            None => "<invalid>".to_string(),
        },
        Err(_) => "<invalid>".to_string(),
    }
}
