/// Errors that can occur while delivering a message to a chat platform.
///
/// These never leave the channel worker: delivery is best-effort, so the
/// worker logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The request could not be sent or no response was received.
    #[error("Notify: HTTP request to {channel} failed: {source}")]
    Http {
        channel: String,
        #[source]
        source: reqwest::Error,
    },

    /// The shared HTTP client could not be constructed.
    #[error("Notify: failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The platform answered with a non-success status.
    #[error("Notify: {channel} returned status {status}")]
    Status { channel: String, status: u16 },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
