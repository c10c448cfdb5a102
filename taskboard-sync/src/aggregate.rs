//! Board aggregate
//!
//! One board, its columns and every task under those columns, published as
//! a single [`BoardSnapshot`] on a `watch` channel.
//!
//! # Loading
//!
//! Changing the scope (board id or user) starts a new load generation. The
//! board row, its columns and its tasks are fetched in parallel; if any of
//! the three fails the whole load fails with that one error. Results from a
//! generation that is no longer current are discarded.
//!
//! # Realtime
//!
//! Once a load yields at least one column, the aggregate starts a
//! [`SubscriptionManager`] for the board. Matching changes trigger a
//! debounced refetch of the same scope. The manager is torn down on every
//! scope change and when the last aggregate handle is dropped.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskboard_shared::session::User;
//! use taskboard_shared::store::MemoryStore;
//! use taskboard_sync::aggregate::BoardAggregate;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let aggregate = BoardAggregate::new(Arc::new(MemoryStore::new()), Duration::from_millis(100));
//! let user = User::new(Uuid::new_v4());
//! aggregate.set_user(Some(user)).await?;
//!
//! let (board, columns) = aggregate.create_default_board("My Kanban Board").await?;
//! aggregate.set_board(Some(board.id)).await?;
//!
//! let snapshot = aggregate.snapshot();
//! assert_eq!(snapshot.columns.len(), columns.len());
//! # Ok(())
//! # }
//! ```

use crate::cache::{fetch_board_tasks, fetch_ordered};
use crate::clock::RevisionClock;
use crate::realtime::{RefreshTarget, SubscriptionManager};
use crate::{SyncError, SyncResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use taskboard_shared::models::{
    default_column_rows, sort_by_position, Board, Column, CreateBoard, Task,
};
use taskboard_shared::session::User;
use taskboard_shared::store::{typed, Query, RemoteStore, StoreError, Table};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;
use validator::Validate;

/// Tasks grouped by column id, each list in position order
pub type TaskMap = HashMap<Uuid, Vec<Task>>;

/// Name used for a board created on first sign-in
pub const DEFAULT_BOARD_NAME: &str = "My Kanban Board";

/// One consistent view of a board
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub board: Option<Board>,

    /// Columns in position order
    pub columns: Vec<Column>,

    /// Every column id has an entry, possibly empty
    pub tasks: TaskMap,

    /// Clock value taken when the fetch behind this snapshot started
    pub revision: u64,

    pub loading: bool,

    /// Error from the last failed load
    pub error: Option<SyncError>,
}

impl BoardSnapshot {
    /// Tasks of a column in position order
    pub fn tasks_in(&self, column_id: Uuid) -> &[Task] {
        self.tasks.get(&column_id).map_or(&[], Vec::as_slice)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    /// Column currently holding a task
    pub fn column_of(&self, task_id: Uuid) -> Option<Uuid> {
        self.tasks
            .iter()
            .find(|(_, tasks)| tasks.iter().any(|task| task.id == task_id))
            .map(|(column_id, _)| *column_id)
    }
}

/// Groups tasks under their columns, dropping tasks whose column is unknown
pub fn group_by_column(columns: &[Column], tasks: Vec<Task>) -> TaskMap {
    let mut grouped: TaskMap = columns.iter().map(|column| (column.id, Vec::new())).collect();
    for task in tasks {
        if let Some(list) = grouped.get_mut(&task.column_id) {
            list.push(task);
        }
    }
    for list in grouped.values_mut() {
        sort_by_position(list);
    }
    grouped
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Scope {
    board_id: Option<Uuid>,
    user: Option<User>,
}

impl Scope {
    fn active(&self) -> Option<(Uuid, &User)> {
        Some((self.board_id?, self.user.as_ref()?))
    }
}

struct AggregateInner {
    store: Arc<dyn RemoteStore>,
    clock: Arc<RevisionClock>,
    debounce: Duration,
    generation: AtomicU64,
    scope: Mutex<Scope>,
    snapshot: watch::Sender<BoardSnapshot>,
    column_ids: watch::Sender<HashSet<Uuid>>,
    subscriptions: Mutex<Option<SubscriptionManager>>,
    self_ref: Weak<AggregateInner>,
}

/// Shared handle to a board aggregate
///
/// Clones share the same state.
#[derive(Clone)]
pub struct BoardAggregate {
    inner: Arc<AggregateInner>,
}

impl BoardAggregate {
    /// Creates an aggregate with no scope
    ///
    /// # Arguments
    ///
    /// * `store` - Remote store
    /// * `debounce` - Quiet period before a realtime-triggered refetch
    pub fn new(store: Arc<dyn RemoteStore>, debounce: Duration) -> Self {
        let (snapshot, _) = watch::channel(BoardSnapshot::default());
        let (column_ids, _) = watch::channel(HashSet::new());
        let inner = Arc::new_cyclic(|self_ref| AggregateInner {
            store,
            clock: Arc::new(RevisionClock::new()),
            debounce,
            generation: AtomicU64::new(0),
            scope: Mutex::new(Scope::default()),
            snapshot,
            column_ids,
            subscriptions: Mutex::new(None),
            self_ref: self_ref.clone(),
        });
        BoardAggregate { inner }
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.inner.store)
    }

    /// Clock stamping snapshot revisions
    pub fn clock(&self) -> Arc<RevisionClock> {
        Arc::clone(&self.inner.clock)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Whether realtime subscriptions are running
    pub async fn is_subscribed(&self) -> bool {
        self.inner
            .subscriptions
            .lock()
            .await
            .as_ref()
            .is_some_and(SubscriptionManager::is_active)
    }

    /// Switches to a board and user, reloading everything
    ///
    /// With no board or no user the snapshot is emptied and nothing is
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns the load error; the snapshot also carries it.
    pub async fn set_scope(&self, board_id: Option<Uuid>, user: Option<User>) -> SyncResult<()> {
        let scope = Scope { board_id, user };
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.scope.lock().await = scope.clone();

        if let Some(manager) = self.inner.subscriptions.lock().await.take() {
            manager.stop();
        }

        let revision = self.inner.clock.tick();
        self.inner.publish(BoardSnapshot {
            revision,
            loading: scope.active().is_some(),
            ..BoardSnapshot::default()
        });
        self.inner.column_ids.send_replace(HashSet::new());

        match scope.active() {
            Some((board_id, user)) => {
                tracing::info!(board_id = %board_id, user_id = %user.id, "Board scope changed");
                self.inner.load(generation).await
            }
            None => {
                tracing::debug!("Board scope cleared");
                Ok(())
            }
        }
    }

    /// Keeps the user, switches the board
    pub async fn set_board(&self, board_id: Option<Uuid>) -> SyncResult<()> {
        let user = self.inner.scope.lock().await.user.clone();
        self.set_scope(board_id, user).await
    }

    /// Keeps the board, switches the user
    pub async fn set_user(&self, user: Option<User>) -> SyncResult<()> {
        let board_id = self.inner.scope.lock().await.board_id;
        self.set_scope(board_id, user).await
    }

    /// Refetches the current scope
    pub async fn refresh(&self) -> SyncResult<()> {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.load(generation).await
    }

    /// Moves a task between cached column lists without touching the store
    ///
    /// The task gets `column_id = dest_column` and is inserted at
    /// `dest_index` (clamped). Returns false if the task is not in
    /// `source_column`.
    pub fn optimistic_move_task(
        &self,
        task_id: Uuid,
        source_column: Uuid,
        dest_column: Uuid,
        dest_index: usize,
    ) -> bool {
        let mut moved = false;
        self.inner.snapshot.send_if_modified(|snapshot| {
            let Some(source) = snapshot.tasks.get_mut(&source_column) else {
                return false;
            };
            let Some(index) = source.iter().position(|task| task.id == task_id) else {
                return false;
            };
            let mut task = source.remove(index);
            task.column_id = dest_column;

            let dest = snapshot.tasks.entry(dest_column).or_default();
            let index = dest_index.min(dest.len());
            dest.insert(index, task);
            moved = true;
            true
        });
        moved
    }

    /// Creates a board with the four default columns for the scoped user
    ///
    /// The board row is inserted first, then all columns in one insert. If
    /// the column insert fails the board row stays behind without columns
    /// and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NoUser`] without a user in scope
    /// - [`SyncError::Invalid`] for a blank name
    /// - [`SyncError::Store`] if either insert fails
    pub async fn create_default_board(&self, name: &str) -> SyncResult<(Board, Vec<Column>)> {
        let user = self
            .inner
            .scope
            .lock()
            .await
            .user
            .clone()
            .ok_or(SyncError::NoUser)?;
        let input = CreateBoard::new(name);
        input.validate()?;

        let store = self.inner.store.as_ref();
        let board: Board = typed::insert_one(store, input.insert_row(user.id, None)).await?;
        tracing::info!(board_id = %board.id, user_id = %user.id, "Default board created");

        let mut columns: Vec<Column> =
            match typed::insert_many(store, default_column_rows(board.id)).await {
                Ok(columns) => columns,
                Err(err) => {
                    tracing::warn!(board_id = %board.id, error = %err, "Default columns not created");
                    return Err(err.into());
                }
            };
        sort_by_position(&mut columns);
        Ok((board, columns))
    }

    /// Every task of a board, in position order
    pub async fn fetch_board_tasks(&self, board_id: Uuid) -> SyncResult<Vec<Task>> {
        fetch_board_tasks(self.inner.store.as_ref(), board_id).await
    }

    /// Stops realtime subscriptions without changing the scope
    pub async fn shutdown(&self) {
        if let Some(manager) = self.inner.subscriptions.lock().await.take() {
            manager.stop();
        }
    }
}

impl AggregateInner {
    fn publish(&self, snapshot: BoardSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn load(&self, generation: u64) -> SyncResult<()> {
        let scope = self.scope.lock().await.clone();
        let Some((board_id, user)) = scope.active() else {
            return Ok(());
        };

        self.snapshot.send_modify(|snapshot| snapshot.loading = true);
        let revision = self.clock.tick();
        let store = self.store.as_ref();

        let board_query = Query::table(Table::Boards)
            .eq("id", board_id)
            .eq("user_id", user.id)
            .limit(1);
        let columns_query = Query::table(Table::Columns).eq("board_id", board_id);

        let result = futures::try_join!(
            async { Ok::<_, SyncError>(typed::select::<Board>(store, board_query).await?) },
            async { Ok::<_, SyncError>(fetch_ordered::<Column>(store, columns_query, None).await?) },
            fetch_board_tasks(store, board_id),
        );

        if !self.is_current(generation) {
            tracing::debug!(board_id = %board_id, generation, "Discarding stale board load");
            return Ok(());
        }

        let (mut boards, columns, tasks) = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::error!(board_id = %board_id, error = %err, "Board load failed");
                self.snapshot.send_modify(|snapshot| {
                    snapshot.loading = false;
                    snapshot.error = Some(err.clone());
                });
                return Err(err);
            }
        };

        let Some(board) = boards.pop() else {
            let err = SyncError::Store(StoreError::NotFound {
                table: Table::Boards,
                id: board_id.to_string(),
            });
            tracing::warn!(board_id = %board_id, "Board not found for user");
            self.snapshot.send_modify(|snapshot| {
                snapshot.loading = false;
                snapshot.error = Some(err.clone());
            });
            return Err(err);
        };

        let tasks = group_by_column(&columns, tasks);
        let has_columns = !columns.is_empty();
        self.column_ids
            .send_replace(columns.iter().map(|column| column.id).collect());

        tracing::debug!(
            board_id = %board_id,
            columns = columns.len(),
            tasks = tasks.values().map(Vec::len).sum::<usize>(),
            revision,
            "Board loaded"
        );
        self.publish(BoardSnapshot {
            board: Some(board),
            columns,
            tasks,
            revision,
            loading: false,
            error: None,
        });

        if has_columns {
            self.ensure_subscriptions(generation, board_id).await;
        }
        Ok(())
    }

    async fn ensure_subscriptions(&self, generation: u64, board_id: Uuid) {
        let mut subscriptions = self.subscriptions.lock().await;
        if !self.is_current(generation) {
            return;
        }
        if subscriptions
            .as_ref()
            .is_some_and(|manager| manager.board_id() == board_id && manager.is_active())
        {
            return;
        }

        let target: Weak<dyn RefreshTarget> = self.self_ref.clone();
        match SubscriptionManager::start(
            Arc::clone(&self.store),
            board_id,
            self.column_ids.subscribe(),
            self.debounce,
            target,
        )
        .await
        {
            Ok(manager) => {
                if let Some(previous) = subscriptions.replace(manager) {
                    previous.stop();
                }
            }
            Err(err) => {
                tracing::info!(board_id = %board_id, error = %err, "Realtime updates unavailable");
            }
        }
    }
}

#[async_trait]
impl RefreshTarget for AggregateInner {
    async fn refresh(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        if let Err(err) = self.load(generation).await {
            tracing::warn!(error = %err, "Realtime refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskboard_shared::models::TaskDraft;
    use taskboard_shared::store::MemoryStore;

    fn column(id: Uuid, position: i32) -> Column {
        let now = Utc::now();
        Column {
            id,
            board_id: Uuid::nil(),
            title: format!("c{position}"),
            position,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(column_id: Uuid, title: &str, position: i32) -> Task {
        Task::placeholder(Uuid::new_v4(), column_id, &TaskDraft::new(title), position)
    }

    #[test]
    fn test_group_by_column_covers_every_column() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tasks = vec![task(a, "a2", 1), task(a, "a1", 0), task(Uuid::new_v4(), "stray", 0)];

        let grouped = group_by_column(&[column(a, 0), column(b, 1)], tasks);
        assert_eq!(grouped.len(), 2);
        assert!(grouped[&b].is_empty());
        let titles: Vec<_> = grouped[&a].iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_set_scope_without_user_clears() {
        let aggregate = BoardAggregate::new(Arc::new(MemoryStore::new()), Duration::from_millis(100));
        aggregate.set_scope(Some(Uuid::new_v4()), None).await.unwrap();

        let snapshot = aggregate.snapshot();
        assert!(snapshot.board.is_none());
        assert!(!snapshot.loading);
        assert!(!aggregate.is_subscribed().await);
    }

    #[tokio::test]
    async fn test_optimistic_move_task() {
        let aggregate = BoardAggregate::new(Arc::new(MemoryStore::new()), Duration::from_millis(100));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let moving = task(a, "t", 0);
        let moving_id = moving.id;
        aggregate.inner.publish(BoardSnapshot {
            columns: vec![column(a, 0), column(b, 1)],
            tasks: HashMap::from([(a, vec![moving]), (b, vec![task(b, "x", 0)])]),
            ..BoardSnapshot::default()
        });

        assert!(aggregate.optimistic_move_task(moving_id, a, b, 0));
        let snapshot = aggregate.snapshot();
        assert!(snapshot.tasks_in(a).is_empty());
        assert_eq!(snapshot.tasks_in(b)[0].id, moving_id);
        assert_eq!(snapshot.tasks_in(b)[0].column_id, b);

        assert!(!aggregate.optimistic_move_task(moving_id, a, b, 0));
    }
}
