//! Realtime subscriptions for one board
//!
//! A [`SubscriptionManager`] owns the two change feeds a board view needs and
//! turns bursts of changes into a single refetch.
//!
//! # Feeds
//!
//! - **columns**: filtered by `board_id` at the store
//! - **tasks**: unfiltered at the store; events are kept only when the
//!   task's `column_id` (new row, else old row) is one of the board's columns
//!
//! # Debounce
//!
//! Every matching event (re)arms one timer. When the timer fires, i.e. once
//! the feeds have been quiet for the debounce window, the refresh target is
//! asked to refetch once.
//!
//! # Lifetime
//!
//! The manager is a scoped resource: dropping it (or calling
//! [`SubscriptionManager::stop`]) cancels the listener, disarms any pending
//! timer and unsubscribes both feeds. The listener holds the refresh target
//! weakly, so it never keeps its owner alive.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashSet;
//! use std::sync::{Arc, Weak};
//! use std::time::Duration;
//! use taskboard_shared::store::MemoryStore;
//! use taskboard_sync::realtime::{RefreshTarget, SubscriptionManager};
//! use tokio::sync::watch;
//! use uuid::Uuid;
//!
//! # async fn example(target: Weak<dyn RefreshTarget>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let (_columns_tx, columns_rx) = watch::channel(HashSet::<Uuid>::new());
//!
//! let manager = SubscriptionManager::start(
//!     store,
//!     Uuid::new_v4(),
//!     columns_rx,
//!     Duration::from_millis(100),
//!     target,
//! )
//! .await?;
//!
//! // Board view closes
//! manager.stop();
//! # Ok(())
//! # }
//! ```

use crate::SyncResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use taskboard_shared::store::{ChangeEvent, Filter, RemoteStore, Subscription, Table};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Debounce window used when none is configured
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Something that can refetch its data on demand
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    async fn refresh(&self);
}

/// Live change feeds for one board
pub struct SubscriptionManager {
    board_id: Uuid,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SubscriptionManager {
    /// Opens both feeds and starts the listener
    ///
    /// # Arguments
    ///
    /// * `store` - Store to subscribe to
    /// * `board_id` - Board whose columns are watched
    /// * `column_ids` - The board's current column ids, for filtering task events
    /// * `debounce` - Quiet period before a refresh
    /// * `target` - Refreshed when the timer fires
    ///
    /// # Errors
    ///
    /// Returns the store error if either feed cannot be opened (for example
    /// a store without realtime support).
    pub async fn start(
        store: Arc<dyn RemoteStore>,
        board_id: Uuid,
        column_ids: watch::Receiver<HashSet<Uuid>>,
        debounce: Duration,
        target: Weak<dyn RefreshTarget>,
    ) -> SyncResult<Self> {
        let columns = store
            .subscribe(Table::Columns, Some(Filter::eq("board_id", board_id)))
            .await?;
        let tasks = match store.subscribe(Table::Tasks, None).await {
            Ok(tasks) => tasks,
            Err(err) => {
                columns.unsubscribe();
                return Err(err.into());
            }
        };

        let cancel = CancellationToken::new();
        let listener = Listener {
            board_id,
            columns,
            tasks,
            column_ids,
            debounce,
            target,
        };
        let handle = tokio::spawn(listener.run(cancel.clone()));

        tracing::info!(board_id = %board_id, debounce_ms = debounce.as_millis() as u64, "Realtime subscriptions started");

        Ok(SubscriptionManager {
            board_id,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn board_id(&self) -> Uuid {
        self.board_id
    }

    /// Whether the listener is still running
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .handle
                .as_ref()
                .map_or(false, |handle| !handle.is_finished())
    }

    /// Tears the subscriptions down
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.handle.take().is_some() {
            self.cancel.cancel();
            tracing::info!(board_id = %self.board_id, "Realtime subscriptions stopped");
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Listener {
    board_id: Uuid,
    columns: Subscription,
    tasks: Subscription,
    column_ids: watch::Receiver<HashSet<Uuid>>,
    debounce: Duration,
    target: Weak<dyn RefreshTarget>,
}

impl Listener {
    /// Whether a task event concerns one of the board's columns
    fn concerns_board(&self, event: &ChangeEvent) -> bool {
        event
            .field("column_id")
            .and_then(|id| Uuid::parse_str(&id).ok())
            .is_some_and(|id| self.column_ids.borrow().contains(&id))
    }

    async fn run(mut self, cancel: CancellationToken) {
        let mut deadline: Option<Instant> = None;

        loop {
            let timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,

                event = self.columns.next() => match event {
                    Some(event) => {
                        tracing::debug!(board_id = %self.board_id, kind = ?event.kind, "Column change");
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    None => break,
                },

                event = self.tasks.next() => match event {
                    Some(event) if self.concerns_board(&event) => {
                        tracing::debug!(board_id = %self.board_id, kind = ?event.kind, "Task change");
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    Some(_) => {}
                    None => break,
                },

                _ = timer => {
                    deadline = None;
                    let Some(target) = self.target.upgrade() else {
                        break;
                    };
                    tracing::debug!(board_id = %self.board_id, "Debounced refresh");
                    target.refresh().await;
                }
            }
        }

        self.columns.unsubscribe();
        self.tasks.unsubscribe();
        tracing::debug!(board_id = %self.board_id, "Realtime listener exited");
    }
}
