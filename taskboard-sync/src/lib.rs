//! # Taskboard Sync Library
//!
//! Optimistic client-side synchronization between a task board's local
//! state and the remote store.
//!
//! ## Modules
//!
//! - `cache`: Entity caches for boards, columns and tasks, plus the per-column task cache registry
//! - `aggregate`: One board with its columns and tasks as a single published snapshot
//! - `realtime`: Scoped change subscriptions with a debounced refetch
//! - `controller`: Working copy of a board's tasks with optimistic apply, confirm and rollback
//! - `notify`: User-facing failure notices
//! - `clock`: Monotonic revision counter shared by the aggregate and controller
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskboard_shared::session::User;
//! use taskboard_shared::store::MemoryStore;
//! use taskboard_sync::aggregate::BoardAggregate;
//! use taskboard_sync::controller::BoardController;
//! use taskboard_sync::notify::LogNotifier;
//! use uuid::Uuid;
//!
//! # async fn example(board_id: Uuid, user: User) -> Result<(), Box<dyn std::error::Error>> {
//! let aggregate = BoardAggregate::new(Arc::new(MemoryStore::new()), Duration::from_millis(100));
//! aggregate.set_scope(Some(board_id), Some(user)).await?;
//!
//! let mut controller = BoardController::from_aggregate(&aggregate, Arc::new(LogNotifier));
//! controller.sync_from_snapshot(&aggregate.snapshot());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod controller;
pub mod error;
pub mod notify;
pub mod realtime;

pub use error::{SyncError, SyncResult};
