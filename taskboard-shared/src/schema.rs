//! Schema capability flags
//!
//! Older deployments of the data service predate `boards.position`. Rather
//! than failing, clients detect the missing column on first use and remember
//! the answer for the rest of the session:
//!
//! ```text
//! Unknown ──(ordered select ok)──────────────▶ Present
//!    │
//!    └──(store error names the column)──────▶ Absent
//! ```
//!
//! Flags are lock-free and shared between caches through an `Arc`.

use crate::store::{Query, RemoteStore, StoreResult, Table};
use std::sync::atomic::{AtomicU8, Ordering};

/// What the client currently knows about an optional column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Not probed yet
    Unknown,
    Present,
    Absent,
}

impl Capability {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Capability::Present,
            2 => Capability::Absent,
            _ => Capability::Unknown,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Capability::Unknown => 0,
            Capability::Present => 1,
            Capability::Absent => 2,
        }
    }
}

/// Lock-free, monotonic capability flag
///
/// Once a column is known to be absent, later successes do not flip it back.
#[derive(Debug, Default)]
pub struct CapabilityFlag(AtomicU8);

impl CapabilityFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Capability {
        Capability::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Whether the column should be used (unknown counts as yes)
    pub fn usable(&self) -> bool {
        self.get() != Capability::Absent
    }

    pub fn mark_present(&self) {
        let _ = self.0.compare_exchange(
            Capability::Unknown.as_u8(),
            Capability::Present.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn mark_absent(&self) {
        self.0.store(Capability::Absent.as_u8(), Ordering::Release);
    }
}

/// Optional columns the client knows how to live without
#[derive(Debug, Default)]
pub struct SchemaCapabilities {
    /// `boards.position`
    pub boards_position: CapabilityFlag,
}

impl SchemaCapabilities {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Checks whether `table.column` exists by ordering a one-row select on it
///
/// # Errors
///
/// Store failures that do not name the column are returned unchanged.
pub async fn probe(store: &dyn RemoteStore, table: Table, column: &str) -> StoreResult<bool> {
    let query = Query::table(table).order_by(column, true).limit(1);
    match store.select(query).await {
        Ok(_) => Ok(true),
        Err(err) if err.mentions_column(column) => {
            tracing::info!(table = %table, column = %column, "Optional column missing from schema");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Operation};

    #[test]
    fn test_flag_transitions() {
        let flag = CapabilityFlag::new();
        assert_eq!(flag.get(), Capability::Unknown);
        assert!(flag.usable());

        flag.mark_present();
        assert_eq!(flag.get(), Capability::Present);

        flag.mark_absent();
        assert_eq!(flag.get(), Capability::Absent);
        assert!(!flag.usable());

        flag.mark_present();
        assert_eq!(flag.get(), Capability::Absent);
    }

    #[tokio::test]
    async fn test_probe_detects_missing_column() {
        let store = MemoryStore::new();
        assert!(probe(&store, Table::Boards, "position").await.unwrap());

        store.drop_column(Table::Boards, "position").await;
        assert!(!probe(&store, Table::Boards, "position").await.unwrap());
    }

    #[tokio::test]
    async fn test_probe_propagates_unrelated_errors() {
        let store = MemoryStore::new();
        store.fail_next(Operation::Select, None, "permission denied").await;
        assert!(probe(&store, Table::Boards, "position").await.is_err());
    }
}
