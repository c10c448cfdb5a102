//! Synchronization error types

use taskboard_shared::store::StoreError;

/// Sync result type alias
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by caches, the aggregate and the controller
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// The remote store failed or rejected the call
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Input failed validation before any remote call
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The operation needs a signed-in user
    #[error("User not authenticated")]
    NoUser,
}

impl SyncError {
    /// Whether the underlying store error names the given column
    pub fn mentions_column(&self, column: &str) -> bool {
        match self {
            SyncError::Store(err) => err.mentions_column(column),
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for SyncError {
    fn from(err: validator::ValidationErrors) -> Self {
        SyncError::Invalid(err.to_string())
    }
}
