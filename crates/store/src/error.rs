/// Errors returned by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Every connection attempt failed. The database is a hard startup
    /// dependency, so callers must treat this as fatal.
    #[error("Store: no database connection after {attempts} attempts: {source}")]
    ConnectionExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Store: database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store: migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Whether the process should terminate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::ConnectionExhausted { .. })
    }
}

/// Convenience `Result` alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A stored row that could not be turned into a record. Treated as missing
/// data rather than a failure.
pub(crate) fn is_data_anomaly(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_fatal() {
        let exhausted = StoreError::ConnectionExhausted {
            attempts: 100,
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(exhausted.is_fatal());
        assert!(exhausted.to_string().contains("100 attempts"));

        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_fatal());
    }

    #[test]
    fn test_decode_errors_are_anomalies() {
        assert!(is_data_anomaly(&sqlx::Error::ColumnNotFound("latest_checked_s".into())));
        assert!(is_data_anomaly(&sqlx::Error::Decode("bad value".into())));
        assert!(!is_data_anomaly(&sqlx::Error::PoolTimedOut));
        assert!(!is_data_anomaly(&sqlx::Error::RowNotFound));
    }
}
