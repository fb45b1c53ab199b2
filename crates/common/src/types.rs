use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported chat platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    GroupMe,
    Discord,
    Slack,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::GroupMe => write!(f, "GroupMe"),
            ChannelKind::Discord => write!(f, "Discord"),
            ChannelKind::Slack => write!(f, "Slack"),
        }
    }
}

/// OAuth credential issued by the upstream provider.
///
/// Rows form an insertion-ordered log keyed by `retrieved_at_ms`; they are
/// appended and pruned, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub scope: Option<String>,
    /// Raw token response body as returned by the provider.
    pub raw_response: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Unix epoch milliseconds at which the token was retrieved.
    pub retrieved_at_ms: i64,
}

impl CredentialRecord {
    /// Unix epoch milliseconds at which the access token stops being valid.
    pub fn expires_at_ms(&self) -> i64 {
        self.retrieved_at_ms
            .saturating_add(self.expires_in.saturating_mul(1000))
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

/// Marks the last time external data was polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CheckpointRecord {
    pub latest_checked_s: i64,
}

/// One entry of the startup-notice log. The most recent row is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StartupFlag {
    pub was_sent: bool,
}

/// Current wall-clock time as Unix epoch seconds.
pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Convert epoch seconds to a UTC timestamp, for logging.
pub fn epoch_seconds_to_utc(epoch_s: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch_s, 0)
}
