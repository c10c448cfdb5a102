//! Remote store contract
//!
//! The hosted data service is consumed through the [`RemoteStore`] trait:
//! row-level select / insert / update / delete against the `boards`,
//! `columns` and `tasks` tables, a batched upsert, and per-table change
//! subscriptions. Rows travel as JSON objects, as they do on the wire; the
//! typed helpers in [`typed`] convert them to [`crate::models`] rows.
//!
//! # Implementations
//!
//! - **Memory** ([`MemoryStore`]): full contract in process, with change
//!   feeds, a write log and injectable failures
//! - **Rest** ([`RestStore`]): PostgREST over HTTP; no realtime feed
//!
//! # Example
//!
//! ```no_run
//! use taskboard_shared::store::{MemoryStore, Query, RemoteStore, Table};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let rows = store
//!     .select(Query::table(Table::Boards).order_by("position", true))
//!     .await?;
//! println!("{} boards", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod change;
pub mod error;
pub mod memory;
pub mod query;
pub mod rest;
pub mod typed;

pub use change::{ChangeEvent, ChangeKind, Subscription};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, Operation, WriteRecord};
pub use query::{json_text, Filter, Order, Query, Table};
pub use rest::{RestConfig, RestStore};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Row-level access to the hosted data service
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Store name, for logging
    fn name(&self) -> &str;

    /// Rows matching the query
    async fn select(&self, query: Query) -> StoreResult<Vec<JsonValue>>;

    /// Inserts rows and returns them as stored (with ids and timestamps)
    async fn insert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>>;

    /// Updates exactly the given columns of one row and returns the stored row
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has the id.
    async fn update(&self, table: Table, id: Uuid, patch: JsonValue) -> StoreResult<JsonValue>;

    /// Deletes one row (owned rows cascade)
    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<()>;

    /// Insert-or-update by primary key, all rows or none
    async fn upsert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>>;

    /// Subscribes to changes on a table, optionally filtered
    ///
    /// Default implementation reports the feed as unsupported.
    async fn subscribe(&self, table: Table, filter: Option<Filter>) -> StoreResult<Subscription> {
        let _ = filter;
        Err(StoreError::Unsupported(format!(
            "{} does not provide change notifications for {}",
            self.name(),
            table
        )))
    }
}
