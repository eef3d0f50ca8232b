//! Error types for ChatRelay

use thiserror::Error;

/// Failure reported by a message store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid message: {0}")]
    Invalid(String),
}

impl StorageError {
    /// Whether the caller may retry the same operation later
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Database(_) | StorageError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Unavailable(err.to_string())
            }
            _ => StorageError::Database(err.to_string()),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::Database("boom".into()).is_retryable());
        assert!(StorageError::Unavailable("down".into()).is_retryable());
        assert!(!StorageError::Invalid("empty body".into()).is_retryable());
    }

    #[test]
    fn test_pool_timeout_maps_to_unavailable() {
        let err: StorageError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
