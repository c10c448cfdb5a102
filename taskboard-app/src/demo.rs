//! Demo board
//!
//! A small board with four columns and five tasks, one or more per
//! quadrant. Used by the binary when no remote store is configured and by
//! the view tests.

use chrono::Utc;
use serde_json::json;
use taskboard_shared::models::{Column, Task, TaskDraft};
use taskboard_shared::store::{MemoryStore, StoreResult, Table};
use taskboard_sync::aggregate::{group_by_column, TaskMap};
use uuid::Uuid;

pub const DEMO_BOARD_NAME: &str = "Demo Board";

pub const DEMO_COLUMNS: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];

struct DemoTask {
    column: usize,
    title: &'static str,
    description: &'static str,
    importance: bool,
    urgency: bool,
    assignee: &'static str,
    tags: &'static [&'static str],
}

const DEMO_TASKS: [DemoTask; 5] = [
    DemoTask {
        column: 0,
        title: "Design new landing page",
        description: "Create wireframes and mockups for the new homepage",
        importance: true,
        urgency: false,
        assignee: "John Doe",
        tags: &["design", "frontend"],
    },
    DemoTask {
        column: 0,
        title: "Fix critical bug in payment system",
        description: "Users cannot complete purchases",
        importance: true,
        urgency: true,
        assignee: "Jane Smith",
        tags: &["bug", "critical", "backend"],
    },
    DemoTask {
        column: 1,
        title: "Update social media content",
        description: "Post daily updates on Twitter and LinkedIn",
        importance: false,
        urgency: true,
        assignee: "Bob Wilson",
        tags: &["marketing", "social"],
    },
    DemoTask {
        column: 2,
        title: "Organize team meeting notes",
        description: "Sort and file meeting notes from last quarter",
        importance: false,
        urgency: false,
        assignee: "Alice Brown",
        tags: &["admin", "organization"],
    },
    DemoTask {
        column: 3,
        title: "Set up development environment",
        description: "Configure local development setup",
        importance: true,
        urgency: false,
        assignee: "Tech Lead",
        tags: &["setup", "development"],
    },
];

impl DemoTask {
    fn draft(&self) -> TaskDraft {
        let mut draft = TaskDraft::new(self.title)
            .with_description(self.description)
            .with_assignee(self.assignee)
            .with_tags(self.tags.iter().copied());
        draft.importance = self.importance;
        draft.urgency = self.urgency;
        draft
    }
}

/// Columns and tasks of the demo board under a fresh board id
pub fn board_state() -> (Vec<Column>, TaskMap) {
    build(Uuid::new_v4())
}

fn build(board_id: Uuid) -> (Vec<Column>, TaskMap) {
    let now = Utc::now();
    let columns: Vec<Column> = DEMO_COLUMNS
        .iter()
        .enumerate()
        .map(|(position, title)| Column {
            id: Uuid::new_v4(),
            board_id,
            title: title.to_string(),
            position: position as i32,
            created_at: now,
            updated_at: now,
        })
        .collect();

    let mut next = [0; DEMO_COLUMNS.len()];
    let tasks: Vec<Task> = DEMO_TASKS
        .iter()
        .map(|demo| {
            let position = next[demo.column];
            next[demo.column] += 1;
            Task::placeholder(Uuid::new_v4(), columns[demo.column].id, &demo.draft(), position)
        })
        .collect();

    let grouped = group_by_column(&columns, tasks);
    (columns, grouped)
}

/// Loads the demo board for a user into a memory store
///
/// Returns the board id.
pub async fn seed(store: &MemoryStore, user_id: Uuid) -> StoreResult<Uuid> {
    let board_id = Uuid::new_v4();
    let (columns, tasks) = build(board_id);

    store
        .seed(
            Table::Boards,
            vec![json!({
                "id": board_id,
                "user_id": user_id,
                "name": DEMO_BOARD_NAME,
                "position": 0,
            })],
        )
        .await;

    let column_rows = columns
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    store.seed(Table::Columns, column_rows).await;

    let task_rows = tasks
        .values()
        .flatten()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    store.seed(Table::Tasks, task_rows).await;

    tracing::info!(board_id = %board_id, user_id = %user_id, tasks = DEMO_TASKS.len(), "Demo board seeded");
    Ok(board_id)
}
