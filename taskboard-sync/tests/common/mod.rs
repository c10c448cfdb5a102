//! Common test utilities for sync integration tests
//!
//! Every context gets:
//! - A fresh in-memory store
//! - A signed-in user with a default board (four columns)
//! - An aggregate scoped to that board and a controller synced to it
//! - The receiving end of the controller's notices

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use taskboard_shared::models::{Column, Task, TaskDraft};
use taskboard_shared::session::User;
use taskboard_shared::store::MemoryStore;
use taskboard_sync::aggregate::BoardAggregate;
use taskboard_sync::controller::BoardController;
use taskboard_sync::notify::{ChannelNotifier, Notice};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub aggregate: BoardAggregate,
    pub controller: BoardController,
    pub notices: UnboundedReceiver<Notice>,
    pub user: User,
    pub board_id: Uuid,
    pub columns: Vec<Column>,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let aggregate = BoardAggregate::new(store.clone(), Duration::from_millis(100));
        let user = User::new(Uuid::new_v4()).with_email("test@example.com");

        aggregate.set_user(Some(user.clone())).await?;
        let (board, columns) = aggregate.create_default_board("Test Board").await?;
        aggregate.set_board(Some(board.id)).await?;

        let (notifier, notices) = ChannelNotifier::channel();
        let mut controller = BoardController::from_aggregate(&aggregate, Arc::new(notifier));
        controller.sync_from_snapshot(&aggregate.snapshot());

        Ok(TestContext {
            store,
            aggregate,
            controller,
            notices,
            user,
            board_id: board.id,
            columns,
        })
    }

    /// Column id by title
    pub fn column(&self, title: &str) -> Uuid {
        self.columns
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.id)
            .unwrap_or_else(|| panic!("no column titled {title}"))
    }

    /// Creates tasks through the controller, in order
    pub async fn add_tasks(&mut self, column_id: Uuid, titles: &[&str]) -> Vec<Task> {
        let mut created = Vec::new();
        for title in titles {
            let task = self
                .controller
                .create_task(column_id, TaskDraft::new(*title))
                .await
                .unwrap_or_else(|| panic!("create {title} failed"));
            created.push(task);
        }
        created
    }

    pub fn titles(&self, column_id: Uuid) -> Vec<String> {
        self.controller
            .tasks_in(column_id)
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    pub fn ids(&self, column_id: Uuid) -> Vec<Uuid> {
        self.controller.tasks_in(column_id).iter().map(|t| t.id).collect()
    }
}
