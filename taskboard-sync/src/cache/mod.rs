//! Entity caches
//!
//! Each cache holds one table's rows for one scope (a user's boards, a
//! board's columns, a column's tasks) and mirrors every mutation to the
//! remote store. The shared rules live in [`EntityCache`]:
//!
//! - A fetch replaces the rows wholesale; a failed fetch sets the error flag,
//!   keeps the previous rows and does not propagate.
//! - Create, update and delete touch the rows only after the store confirms;
//!   on failure the error is returned and the rows are unchanged.
//! - A reorder is one batched write of `position = index` for every row; on
//!   success the rows take the given order verbatim.
//!
//! Fetches order by `position` ascending. When the store reports that the
//! column does not exist, the fetch retries by `created_at` descending.

pub mod boards;
pub mod columns;
pub mod registry;
pub mod tasks;

pub use boards::BoardCache;
pub use columns::ColumnCache;
pub use registry::TaskCacheRegistry;
pub use tasks::{fetch_board_tasks, TaskCache};
pub(crate) use tasks::validate_draft;

use crate::{SyncError, SyncResult};
use serde_json::Value as JsonValue;
use taskboard_shared::models::{sort_by_position, FieldPatch, Record};
use taskboard_shared::schema::CapabilityFlag;
use taskboard_shared::store::{typed, Query, RemoteStore, StoreResult};
use uuid::Uuid;

/// Column every fetch orders by when the schema has it
pub const POSITION: &str = "position";

/// Fallback ordering column
pub const CREATED_AT: &str = "created_at";

/// Selects rows ordered by position, degrading to `created_at desc`
///
/// When a capability flag is given, a known-absent column skips straight to
/// the fallback and a successful ordered select marks it present.
pub async fn fetch_ordered<R: Record>(
    store: &dyn RemoteStore,
    query: Query,
    capability: Option<&CapabilityFlag>,
) -> StoreResult<Vec<R>> {
    if capability.map_or(true, |flag| flag.usable()) {
        match typed::select::<R>(store, query.clone().order_by(POSITION, true)).await {
            Ok(rows) => {
                if let Some(flag) = capability {
                    flag.mark_present();
                }
                return Ok(rows);
            }
            Err(err) if err.mentions_column(POSITION) => {
                tracing::info!(
                    table = %R::TABLE,
                    error = %err,
                    "Ordering column missing, falling back to created_at"
                );
                if let Some(flag) = capability {
                    flag.mark_absent();
                }
            }
            Err(err) => return Err(err),
        }
    }
    typed::select::<R>(store, query.order_by(CREATED_AT, false)).await
}

/// Rows of one table for one scope, plus fetch status
#[derive(Debug, Clone)]
pub struct EntityCache<R: Record> {
    rows: Vec<R>,
    loading: bool,
    error: Option<SyncError>,
}

impl<R: Record> Default for EntityCache<R> {
    fn default() -> Self {
        EntityCache {
            rows: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<R: Record> EntityCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn get(&self, id: Uuid) -> Option<&R> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Error from the last failed operation, cleared by the next successful fetch
    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    /// Replaces the rows without a store round trip
    pub fn replace(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }

    /// Appends a row and keeps the rows sorted by position
    pub fn insert_sorted(&mut self, row: R) {
        self.rows.retain(|existing| existing.id() != row.id());
        self.rows.push(row);
        sort_by_position(&mut self.rows);
    }

    /// Replaces a row in place; false if the id is not cached
    pub fn replace_row(&mut self, row: R) -> bool {
        match self.rows.iter_mut().find(|existing| existing.id() == row.id()) {
            Some(existing) => {
                *existing = row;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<R> {
        let index = self.rows.iter().position(|row| row.id() == id)?;
        Some(self.rows.remove(index))
    }

    /// Records a failure and hands the error back
    fn fail(&mut self, err: impl Into<SyncError>) -> SyncError {
        let err = err.into();
        self.error = Some(err.clone());
        err
    }

    /// Loads the scope's rows; returns whether the fetch succeeded
    pub async fn load(
        &mut self,
        store: &dyn RemoteStore,
        query: Query,
        capability: Option<&CapabilityFlag>,
    ) -> bool {
        self.loading = true;
        let result = fetch_ordered::<R>(store, query, capability).await;
        self.loading = false;

        match result {
            Ok(rows) => {
                tracing::debug!(table = %R::TABLE, rows = rows.len(), "Cache loaded");
                self.rows = rows;
                self.error = None;
                true
            }
            Err(err) => {
                tracing::error!(table = %R::TABLE, error = %err, "Cache fetch failed");
                self.fail(err);
                false
            }
        }
    }

    /// Inserts one row and caches the stored row
    pub async fn create(&mut self, store: &dyn RemoteStore, row: JsonValue) -> SyncResult<R> {
        match typed::insert_one::<R>(store, row).await {
            Ok(created) => {
                self.insert_sorted(created.clone());
                Ok(created)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Sends a field patch and caches the stored row
    pub async fn update<P>(&mut self, store: &dyn RemoteStore, id: Uuid, patch: &P) -> SyncResult<R>
    where
        P: FieldPatch<R> + Sync,
    {
        match typed::update::<R, P>(store, id, patch).await {
            Ok(updated) => {
                self.replace_row(updated.clone());
                Ok(updated)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub async fn delete(&mut self, store: &dyn RemoteStore, id: Uuid) -> SyncResult<()> {
        match typed::delete::<R>(store, id).await {
            Ok(()) => {
                self.remove(id);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Writes `position = index` for every row in one batched upsert
    ///
    /// `encode` builds the full upsert row for a record at an index.
    pub async fn reorder<F>(&mut self, store: &dyn RemoteStore, mut ordered: Vec<R>, encode: F) -> SyncResult<()>
    where
        F: Fn(&R, usize) -> JsonValue,
    {
        let rows: Vec<JsonValue> = ordered
            .iter()
            .enumerate()
            .map(|(index, row)| encode(row, index))
            .collect();

        if let Err(err) = store.upsert(R::TABLE, rows).await {
            tracing::error!(table = %R::TABLE, error = %err, "Batched reorder failed");
            return Err(self.fail(err));
        }

        for (index, row) in ordered.iter_mut().enumerate() {
            row.set_position(index as i32);
        }
        self.rows = ordered;
        Ok(())
    }
}

/// Moves the element at `from` to `to`, clamping `to` to the list
///
/// Returns false (and leaves the list alone) when `from` is out of range.
pub fn splice<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    true
}
