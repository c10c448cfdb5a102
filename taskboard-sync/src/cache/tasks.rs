//! Task cache
//!
//! The tasks of one column, ordered by position.
//!
//! # Move vs. reorder
//!
//! - [`TaskCache::move_to`] is a single update of `column_id` and `position`;
//!   a task moved out of this column leaves the cache.
//! - [`TaskCache::reorder`] rewrites the whole column in one batched upsert.
//!   Rows are sent in full with blank optional text as null and without
//!   `created_at`, so the upsert never overwrites server-owned fields.

use super::{fetch_ordered, EntityCache};
use crate::{SyncError, SyncResult};
use std::sync::Arc;
use taskboard_shared::models::{next_position, Task, TaskDraft, TaskPatch};
use taskboard_shared::store::{Query, RemoteStore, Table};
use uuid::Uuid;
use validator::Validate;

/// All tasks of a board, ordered by position
///
/// Tasks are matched through their column's `board_id`.
pub async fn fetch_board_tasks(store: &dyn RemoteStore, board_id: Uuid) -> SyncResult<Vec<Task>> {
    let query = Query::table(Table::Tasks).parent_eq(Table::Columns, "board_id", board_id);
    Ok(fetch_ordered::<Task>(store, query, None).await?)
}

/// Validates a task draft, treating a whitespace-only title as missing
pub(crate) fn validate_draft(draft: &TaskDraft) -> SyncResult<()> {
    draft.validate()?;
    if draft.title.trim().is_empty() {
        return Err(SyncError::Invalid("task title is required".to_string()));
    }
    Ok(())
}

/// Tasks of one column
pub struct TaskCache {
    store: Arc<dyn RemoteStore>,
    column_id: Uuid,
    cache: EntityCache<Task>,
}

impl TaskCache {
    pub fn new(store: Arc<dyn RemoteStore>, column_id: Uuid) -> Self {
        TaskCache {
            store,
            column_id,
            cache: EntityCache::new(),
        }
    }

    pub fn column_id(&self) -> Uuid {
        self.column_id
    }

    pub fn tasks(&self) -> &[Task] {
        self.cache.rows()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.cache.get(id)
    }

    pub fn loading(&self) -> bool {
        self.cache.loading()
    }

    pub fn error(&self) -> Option<&SyncError> {
        self.cache.error()
    }

    /// Replaces the cached tasks with rows loaded elsewhere
    pub fn seed(&mut self, tasks: Vec<Task>) {
        self.cache.replace(tasks);
    }

    /// Caches a task that arrived from another column
    pub fn accept(&mut self, task: Task) {
        self.cache.insert_sorted(task);
    }

    pub async fn fetch_all(&mut self) -> bool {
        let query = Query::table(Table::Tasks).eq("column_id", self.column_id);
        self.cache.load(self.store.as_ref(), query, None).await
    }

    /// Creates a task at the end of the column
    ///
    /// # Errors
    ///
    /// - [`SyncError::Invalid`] for a blank title (nothing is sent)
    /// - [`SyncError::Store`] if the insert fails
    pub async fn create(&mut self, draft: &TaskDraft) -> SyncResult<Task> {
        validate_draft(draft)?;
        let position = next_position(self.cache.rows());
        let task = self
            .cache
            .create(self.store.as_ref(), draft.insert_row(self.column_id, position))
            .await?;
        tracing::debug!(task_id = %task.id, column_id = %self.column_id, position, "Task created");
        Ok(task)
    }

    /// Sends the patched fields and caches the stored task
    pub async fn update(&mut self, id: Uuid, patch: &TaskPatch) -> SyncResult<Task> {
        if let TaskPatch::Details(draft) = patch {
            validate_draft(draft)?;
        }
        self.cache.update(self.store.as_ref(), id, patch).await
    }

    pub async fn delete(&mut self, id: Uuid) -> SyncResult<()> {
        self.cache.delete(self.store.as_ref(), id).await
    }

    /// Moves a task to a column and position in one update
    ///
    /// On success the task leaves this cache if `column_id` is another
    /// column, otherwise it is replaced in place.
    pub async fn move_to(&mut self, id: Uuid, column_id: Uuid, position: i32) -> SyncResult<Task> {
        let patch = TaskPatch::Placement {
            column_id,
            position,
        };
        let task = self.cache.update(self.store.as_ref(), id, &patch).await?;
        if column_id != self.column_id {
            self.cache.remove(id);
        }
        tracing::debug!(
            task_id = %id,
            from_column = %self.column_id,
            to_column = %column_id,
            position,
            "Task moved"
        );
        Ok(task)
    }

    /// Persists a new order for the column's tasks in one batched write
    pub async fn reorder(&mut self, ordered: Vec<Task>) -> SyncResult<()> {
        self.cache
            .reorder(self.store.as_ref(), ordered, |task, index| task.reorder_row(index))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::store::MemoryStore;

    #[tokio::test]
    async fn test_create_positions_in_empty_column() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = TaskCache::new(store, Uuid::new_v4());

        let first = cache.create(&TaskDraft::new("one")).await.unwrap();
        let second = cache.create(&TaskDraft::new("two")).await.unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
    }

    #[tokio::test]
    async fn test_blank_title_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = TaskCache::new(store.clone(), Uuid::new_v4());

        let err = cache.create(&TaskDraft::new("   ")).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid(_)));
        assert!(store.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_title_from_json_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = TaskCache::new(store.clone(), Uuid::new_v4());
        let draft: TaskDraft = serde_json::from_value(serde_json::json!({"title": "   "})).unwrap();

        let err = cache.create(&draft).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid(_)));
        assert!(cache.tasks().is_empty());
        assert!(store.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_move_to_other_column_removes_row() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = TaskCache::new(store, Uuid::new_v4());
        let task = cache.create(&TaskDraft::new("t")).await.unwrap();
        let other = Uuid::new_v4();

        let moved = cache.move_to(task.id, other, 0).await.unwrap();
        assert_eq!(moved.column_id, other);
        assert!(cache.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_move_within_column_replaces_row() {
        let store = Arc::new(MemoryStore::new());
        let column = Uuid::new_v4();
        let mut cache = TaskCache::new(store, column);
        let task = cache.create(&TaskDraft::new("t")).await.unwrap();

        let moved = cache.move_to(task.id, column, 5).await.unwrap();
        assert_eq!(moved.position, 5);
        assert_eq!(cache.tasks()[0].position, 5);
    }

    #[tokio::test]
    async fn test_update_replaces_with_server_row() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = TaskCache::new(store, Uuid::new_v4());
        let task = cache.create(&TaskDraft::new("t")).await.unwrap();

        let updated = cache
            .update(task.id, &TaskPatch::Title("renamed".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(cache.get(task.id).unwrap().title, "renamed");
    }
}
