//! Store error types

use super::Table;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a [`RemoteStore`](super::RemoteStore)
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store rejected the request (constraint, permission, schema...)
    #[error("{message}")]
    Rejected {
        /// Store-specific error code, when provided
        code: Option<String>,

        /// Human-readable message from the store
        message: String,
    },

    /// A single-row operation matched no row
    #[error("No {table} row with id {id}")]
    NotFound { table: Table, id: String },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// A row could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store does not implement the operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl StoreError {
    /// Creates a rejection with just a message
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            code: None,
            message: message.into(),
        }
    }

    /// Whether the store message names the given column
    ///
    /// Used to detect schemas that predate a column (e.g. `boards.position`).
    pub fn mentions_column(&self, column: &str) -> bool {
        match self {
            StoreError::Rejected { message, .. } => message.contains(column),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Serialization(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_column() {
        let err = StoreError::rejected("column boards.position does not exist");
        assert!(err.mentions_column("position"));
        assert!(!err.mentions_column("created_at"));

        let network = StoreError::Network("position".to_string());
        assert!(!network.mentions_column("position"));
    }

    #[test]
    fn test_display_uses_store_message() {
        let err = StoreError::rejected("permission denied for table tasks");
        assert_eq!(err.to_string(), "permission denied for table tasks");
    }
}
