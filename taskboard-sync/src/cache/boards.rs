//! Board cache
//!
//! The signed-in user's boards. Boards order by `position` when the schema
//! has it; older schemas without the column fall back to newest-first and
//! create boards without a position. The outcome of the first attempt is
//! remembered in [`SchemaCapabilities`] so later calls skip the failing path.

use super::{splice, EntityCache};
use crate::{SyncError, SyncResult};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use taskboard_shared::models::{next_position, Board, BoardPatch, CreateBoard};
use taskboard_shared::schema::SchemaCapabilities;
use taskboard_shared::session::User;
use taskboard_shared::store::{typed, Query, RemoteStore, Table};
use uuid::Uuid;
use validator::Validate;

/// Boards owned by one user
pub struct BoardCache {
    store: Arc<dyn RemoteStore>,
    capabilities: Arc<SchemaCapabilities>,
    user: Option<User>,
    cache: EntityCache<Board>,
}

impl BoardCache {
    pub fn new(store: Arc<dyn RemoteStore>, capabilities: Arc<SchemaCapabilities>) -> Self {
        BoardCache {
            store,
            capabilities,
            user: None,
            cache: EntityCache::new(),
        }
    }

    pub fn boards(&self) -> &[Board] {
        self.cache.rows()
    }

    pub fn loading(&self) -> bool {
        self.cache.loading()
    }

    pub fn error(&self) -> Option<&SyncError> {
        self.cache.error()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Switches the scope to another user (or none) and refetches
    pub async fn set_user(&mut self, user: Option<User>) -> bool {
        self.user = user;
        self.fetch_all().await
    }

    /// Loads the user's boards; without a user the cache is emptied
    pub async fn fetch_all(&mut self) -> bool {
        let Some(user) = &self.user else {
            self.cache.replace(Vec::new());
            return true;
        };
        let query = Query::table(Table::Boards).eq("user_id", user.id);
        self.cache
            .load(
                self.store.as_ref(),
                query,
                Some(&self.capabilities.boards_position),
            )
            .await
    }

    /// Creates a board at the end of the list
    ///
    /// # Errors
    ///
    /// - [`SyncError::NoUser`] without a signed-in user
    /// - [`SyncError::Invalid`] for a blank name
    /// - [`SyncError::Store`] if the insert fails
    pub async fn create(&mut self, name: impl Into<String>) -> SyncResult<Board> {
        let user_id = self.user.as_ref().ok_or(SyncError::NoUser)?.id;
        let input = CreateBoard::new(name);
        input.validate()?;

        let flag = &self.capabilities.boards_position;
        if flag.usable() {
            let position = next_position(self.cache.rows());
            let row = input.insert_row(user_id, Some(position));
            match self.cache.create(self.store.as_ref(), row).await {
                Ok(board) => {
                    flag.mark_present();
                    tracing::info!(board_id = %board.id, user_id = %user_id, "Board created");
                    return Ok(board);
                }
                Err(err) if err.mentions_column("position") => {
                    tracing::info!(error = %err, "Creating board without position");
                    flag.mark_absent();
                }
                Err(err) => return Err(err),
            }
        }

        let board = self
            .cache
            .create(self.store.as_ref(), input.insert_row(user_id, None))
            .await?;
        tracing::info!(board_id = %board.id, user_id = %user_id, "Board created");
        Ok(board)
    }

    pub async fn update(&mut self, id: Uuid, patch: BoardPatch) -> SyncResult<Board> {
        self.cache.update(self.store.as_ref(), id, &patch).await
    }

    pub async fn rename(&mut self, id: Uuid, name: impl Into<String>) -> SyncResult<Board> {
        let input = CreateBoard::new(name);
        input.validate()?;
        self.update(id, BoardPatch::Rename(input.name)).await
    }

    /// Deletes a board; its columns and tasks go with it
    pub async fn delete(&mut self, id: Uuid) -> SyncResult<()> {
        self.cache.delete(self.store.as_ref(), id).await?;
        tracing::info!(board_id = %id, "Board deleted");
        Ok(())
    }

    /// Moves the board at `from` to `to`
    ///
    /// The new order is applied locally first and every board's position is
    /// written as its index. If any write fails the cache is refetched to
    /// drop the optimistic order and the first error is returned.
    pub async fn reorder(&mut self, from: usize, to: usize) -> SyncResult<()> {
        if self.user.is_none() {
            return Err(SyncError::NoUser);
        }

        let mut boards = self.cache.rows().to_vec();
        if !splice(&mut boards, from, to) {
            return Ok(());
        }
        for (index, board) in boards.iter_mut().enumerate() {
            board.position = Some(index as i32);
        }
        self.cache.replace(boards.clone());

        let store = self.store.as_ref();
        let results = join_all(boards.iter().map(|board| {
            let patch = json!({ "position": board.position });
            store.update(Table::Boards, board.id, patch)
        }))
        .await;

        if let Some(err) = results.into_iter().find_map(Result::err) {
            tracing::error!(error = %err, "Board reorder failed, reverting");
            self.fetch_all().await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Board by id, reading through to the store when not cached
    pub async fn find(&self, id: Uuid) -> SyncResult<Option<Board>> {
        if let Some(board) = self.cache.get(id) {
            return Ok(Some(board.clone()));
        }
        let mut rows =
            typed::select::<Board>(self.store.as_ref(), Query::table(Table::Boards).eq("id", id))
                .await?;
        Ok(rows.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::store::{MemoryStore, Operation};

    fn cache_for(store: &Arc<MemoryStore>) -> BoardCache {
        BoardCache::new(store.clone(), Arc::new(SchemaCapabilities::new()))
    }

    #[tokio::test]
    async fn test_create_without_user_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        assert!(matches!(cache.create("B").await, Err(SyncError::NoUser)));
    }

    #[tokio::test]
    async fn test_create_assigns_next_position() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        cache.set_user(Some(User::new(Uuid::new_v4()))).await;

        let first = cache.create("One").await.unwrap();
        let second = cache.create("Two").await.unwrap();
        assert_eq!(first.position, Some(0));
        assert_eq!(second.position, Some(1));
        assert_eq!(cache.boards().len(), 2);
    }

    #[tokio::test]
    async fn test_create_falls_back_without_position_column() {
        let store = Arc::new(MemoryStore::new());
        store.drop_column(Table::Boards, "position").await;
        let capabilities = Arc::new(SchemaCapabilities::new());
        let mut cache = BoardCache::new(store.clone(), capabilities.clone());
        cache.user = Some(User::new(Uuid::new_v4()));

        let board = cache.create("Legacy").await.unwrap();
        assert_eq!(board.position, None);
        assert!(!capabilities.boards_position.usable());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_store() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        cache.user = Some(User::new(Uuid::new_v4()));

        assert!(matches!(cache.create("  ").await, Err(SyncError::Invalid(_))));
        assert!(store.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_reorder_failure_refetches() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        cache.set_user(Some(User::new(Uuid::new_v4()))).await;
        for name in ["A", "B", "C"] {
            cache.create(name).await.unwrap();
        }

        store.fail_next(Operation::Update, Some(Table::Boards), "locked").await;
        assert!(cache.reorder(2, 0).await.is_err());

        let names: Vec<_> = cache.boards().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        cache.set_user(Some(User::new(Uuid::new_v4()))).await;
        let board = cache.create("Old").await.unwrap();
        store
            .seed(Table::Columns, vec![json!({"board_id": board.id, "title": "Todo", "position": 0})])
            .await;

        let renamed = cache.rename(board.id, "New").await.unwrap();
        assert_eq!(renamed.name, "New");
        assert_eq!(cache.boards()[0].name, "New");
        assert!(matches!(cache.rename(board.id, " ").await, Err(SyncError::Invalid(_))));

        cache.delete(board.id).await.unwrap();
        assert!(cache.boards().is_empty());
        assert!(store.rows(Table::Columns).await.is_empty());
    }

    #[tokio::test]
    async fn test_set_user_none_clears() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = cache_for(&store);
        cache.set_user(Some(User::new(Uuid::new_v4()))).await;
        cache.create("A").await.unwrap();

        cache.set_user(None).await;
        assert!(cache.boards().is_empty());
    }
}
