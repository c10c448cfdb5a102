//! Column cache
//!
//! The columns of one board, ordered by position. New columns go after the
//! current last one; reordering rewrites every column's position.

use super::EntityCache;
use crate::{SyncError, SyncResult};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use taskboard_shared::models::{next_position, Column, ColumnPatch, CreateColumn};
use taskboard_shared::store::{Query, RemoteStore, StoreError, Table};
use uuid::Uuid;
use validator::Validate;

/// Columns of one board
pub struct ColumnCache {
    store: Arc<dyn RemoteStore>,
    board_id: Option<Uuid>,
    cache: EntityCache<Column>,
}

impl ColumnCache {
    pub fn new(store: Arc<dyn RemoteStore>, board_id: Option<Uuid>) -> Self {
        ColumnCache {
            store,
            board_id,
            cache: EntityCache::new(),
        }
    }

    pub fn board_id(&self) -> Option<Uuid> {
        self.board_id
    }

    pub fn columns(&self) -> &[Column] {
        self.cache.rows()
    }

    pub fn loading(&self) -> bool {
        self.cache.loading()
    }

    pub fn error(&self) -> Option<&SyncError> {
        self.cache.error()
    }

    /// Switches to another board (or none) and refetches
    pub async fn set_board(&mut self, board_id: Option<Uuid>) -> bool {
        self.board_id = board_id;
        self.fetch_all().await
    }

    pub async fn fetch_all(&mut self) -> bool {
        let Some(board_id) = self.board_id else {
            self.cache.replace(Vec::new());
            return true;
        };
        let query = Query::table(Table::Columns).eq("board_id", board_id);
        self.cache.load(self.store.as_ref(), query, None).await
    }

    fn require_board(&self) -> SyncResult<Uuid> {
        self.board_id
            .ok_or_else(|| StoreError::rejected("Board ID is required").into())
    }

    /// Creates a column after the last one
    pub async fn create(&mut self, title: impl Into<String>) -> SyncResult<Column> {
        let board_id = self.require_board()?;
        let input = CreateColumn::new(title);
        input.validate()?;

        let position = next_position(self.cache.rows());
        let column = self
            .cache
            .create(self.store.as_ref(), input.insert_row(board_id, position))
            .await?;
        tracing::debug!(column_id = %column.id, board_id = %board_id, position, "Column created");
        Ok(column)
    }

    pub async fn update(&mut self, id: Uuid, patch: ColumnPatch) -> SyncResult<Column> {
        self.cache.update(self.store.as_ref(), id, &patch).await
    }

    pub async fn rename(&mut self, id: Uuid, title: impl Into<String>) -> SyncResult<Column> {
        let input = CreateColumn::new(title);
        input.validate()?;
        self.update(id, ColumnPatch::Rename(input.title)).await
    }

    /// Deletes a column and, on the store side, its tasks
    pub async fn delete(&mut self, id: Uuid) -> SyncResult<()> {
        self.cache.delete(self.store.as_ref(), id).await
    }

    /// Persists a new column order
    ///
    /// Writes `position = index` for every column in one batch. On success
    /// the cache takes `ordered` as given; on failure it is unchanged.
    pub async fn reorder(&mut self, ordered: Vec<Column>) -> SyncResult<()> {
        let now = Utc::now();
        self.cache
            .reorder(self.store.as_ref(), ordered, |column, index| {
                json!({
                    "id": column.id,
                    "board_id": column.board_id,
                    "title": column.title,
                    "position": index as i32,
                    "updated_at": now,
                })
            })
            .await
    }
}
