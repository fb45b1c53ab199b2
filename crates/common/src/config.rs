use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Default GroupMe bot post endpoint.
pub const GROUPME_API_URL: &str = "https://api.groupme.com/v3/bots/post";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 2)
    pub db_max_connections: u32,

    /// Seconds a single connection attempt may take before it counts as failed (default: 5)
    pub db_acquire_timeout_secs: u64,

    /// Connection attempts before the store gives up for good (default: 100)
    pub db_connect_max_attempts: u32,

    /// Fixed delay between connection attempts in seconds (default: 5)
    pub db_connect_retry_delay_secs: u64,

    /// Send a notice on every restart, not just the first start
    pub restart_message: bool,

    /// Per-channel connection settings
    pub channels: ChannelsConfig,

    /// Pause between consecutive chunks of one message (default: 1000)
    pub message_chunk_interval_ms: u64,

    /// Timeout for a single webhook request (default: 10)
    pub http_timeout_secs: u64,

    /// How long shutdown waits for in-flight deliveries (default: 30)
    pub shutdown_grace_secs: u64,
}

/// Connection settings for every chat platform. A platform is active only
/// when its required setting is present.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    pub groupme_bot_id: Option<String>,
    pub groupme_api_url: String,
    pub groupme_max_message_len: usize,

    pub discord_webhook_url: Option<String>,
    pub discord_max_message_len: usize,

    pub slack_webhook_url: Option<String>,
    pub slack_max_message_len: usize,
}

impl ChannelsConfig {
    pub fn groupme_configured(&self) -> bool {
        self.groupme_bot_id.is_some()
    }

    pub fn discord_configured(&self) -> bool {
        self.discord_webhook_url.is_some()
    }

    pub fn slack_configured(&self) -> bool {
        self.slack_webhook_url.is_some()
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            groupme_bot_id: None,
            groupme_api_url: GROUPME_API_URL.to_string(),
            groupme_max_message_len: 1000,
            discord_webhook_url: None,
            discord_max_message_len: 2000,
            slack_webhook_url: None,
            slack_max_message_len: 40000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 2)?,
            db_acquire_timeout_secs: parse_or(&var, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            db_connect_max_attempts: parse_or(&var, "DB_CONNECT_MAX_ATTEMPTS", 100)?,
            db_connect_retry_delay_secs: parse_or(&var, "DB_CONNECT_RETRY_DELAY_SECS", 5)?,
            restart_message: var("RESTART_MESSAGE")
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            channels: ChannelsConfig {
                groupme_bot_id: var("GROUPME_BOT_ID"),
                groupme_api_url: var("GROUPME_API_URL")
                    .unwrap_or_else(|| GROUPME_API_URL.to_string()),
                groupme_max_message_len: parse_or(&var, "GROUPME_MAX_MESSAGE_LEN", 1000)?,
                discord_webhook_url: var("DISCORD_WEBHOOK_URL"),
                discord_max_message_len: parse_or(&var, "DISCORD_MAX_MESSAGE_LEN", 2000)?,
                slack_webhook_url: var("SLACK_WEBHOOK_URL"),
                slack_max_message_len: parse_or(&var, "SLACK_MAX_MESSAGE_LEN", 40000)?,
            },
            message_chunk_interval_ms: parse_or(&var, "MESSAGE_CHUNK_INTERVAL_MS", 1000)?,
            http_timeout_secs: parse_or(&var, "HTTP_TIMEOUT_SECS", 10)?,
            shutdown_grace_secs: parse_or(&var, "SHUTDOWN_GRACE_SECS", 30)?,
        })
    }

    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.message_chunk_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}
