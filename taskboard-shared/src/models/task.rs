//! Task model
//!
//! Tasks are the atomic work items of a board. A task lives in exactly one
//! column, is ordered within it by `position`, and is classified by its
//! `importance` and `urgency` flags.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     column_id UUID NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
//!     title TEXT NOT NULL,
//!     description TEXT,
//!     importance BOOLEAN NOT NULL DEFAULT FALSE,
//!     urgency BOOLEAN NOT NULL DEFAULT FALSE,
//!     assignee TEXT,
//!     due_date DATE,
//!     tags TEXT[] NOT NULL DEFAULT '{}',
//!     position INTEGER NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```
//! use taskboard_shared::models::{Quadrant, TaskDraft};
//!
//! let draft = TaskDraft::new("Fix payment bug").important().urgent();
//! assert_eq!(Quadrant::classify(draft.importance, draft.urgency), Quadrant::UrgentImportant);
//! ```

use super::{FieldPatch, Quadrant, Record};
use crate::store::Table;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID (a temporary client ID while an optimistic create is in flight)
    pub id: Uuid,

    /// Owning column
    pub column_id: Uuid,

    /// Title (required)
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Important flag
    #[serde(default)]
    pub importance: bool,

    /// Urgent flag
    #[serde(default)]
    pub urgency: bool,

    /// Person the task is assigned to
    #[serde(default)]
    pub assignee: Option<String>,

    /// Due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Ordered tag list
    #[serde(default)]
    pub tags: Vec<String>,

    /// Ordering within the column
    #[serde(default)]
    pub position: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Record for Task {
    const TABLE: Table = Table::Tasks;

    fn id(&self) -> Uuid {
        self.id
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

impl Task {
    /// Builds a local placeholder for an optimistic create
    ///
    /// The placeholder carries a client-side temporary ID and local
    /// timestamps until the store returns the real row.
    pub fn placeholder(temp_id: Uuid, column_id: Uuid, draft: &TaskDraft, position: i32) -> Self {
        let now = Utc::now();
        Task {
            id: temp_id,
            column_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            importance: draft.importance,
            urgency: draft.urgency,
            assignee: draft.assignee.clone(),
            due_date: draft.due_date,
            tags: draft.tags.clone(),
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quadrant derived from the task's flags
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::of(self)
    }

    /// Full row for a batched reorder upsert
    ///
    /// The row carries `position = index`, a fresh `updated_at`, no
    /// `created_at`, and blank optional text written as null.
    pub fn reorder_row(&self, index: usize) -> JsonValue {
        json!({
            "id": self.id,
            "column_id": self.column_id,
            "title": self.title,
            "description": non_blank(&self.description),
            "importance": self.importance,
            "urgency": self.urgency,
            "assignee": non_blank(&self.assignee),
            "due_date": self.due_date,
            "tags": self.tags,
            "position": index as i32,
            "updated_at": Utc::now(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// User-editable task fields, used for create and for the edit dialog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    /// Title (required, non-blank)
    #[validate(length(min = 1, message = "task title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[serde(default)]
    pub importance: bool,

    #[serde(default)]
    pub urgency: bool,

    pub assignee: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaskDraft {
    /// Creates a draft with a trimmed title and every other field empty
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into().trim().to_string(),
            ..Default::default()
        }
    }

    pub fn important(mut self) -> Self {
        self.importance = true;
        self
    }

    pub fn urgent(mut self) -> Self {
        self.urgency = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Insert payload for the given column and position
    pub fn insert_row(&self, column_id: Uuid, position: i32) -> JsonValue {
        json!({
            "column_id": column_id,
            "title": self.title,
            "description": non_blank(&self.description),
            "importance": self.importance,
            "urgency": self.urgency,
            "assignee": non_blank(&self.assignee),
            "due_date": self.due_date,
            "tags": self.tags,
            "position": position,
        })
    }
}

/// Partial update for a task
///
/// One variant per mutable field or logical group of fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPatch {
    Title(String),
    Description(Option<String>),
    Importance(bool),
    Urgency(bool),

    /// Both flags at once (a quadrant move)
    Classification { importance: bool, urgency: bool },

    Assignee(Option<String>),
    DueDate(Option<NaiveDate>),
    Tags(Vec<String>),

    /// Reorder within the current column
    Position(i32),

    /// Move to another column at a position
    Placement { column_id: Uuid, position: i32 },

    /// Every user-editable field, as submitted by the edit dialog
    Details(TaskDraft),
}

impl TaskPatch {
    /// Patch that puts a task into a quadrant
    pub fn quadrant(quadrant: Quadrant) -> Self {
        let (importance, urgency) = quadrant.flags();
        TaskPatch::Classification {
            importance,
            urgency,
        }
    }
}

impl FieldPatch<Task> for TaskPatch {
    fn changes(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        match self {
            TaskPatch::Title(title) => {
                map.insert("title".to_string(), json!(title));
            }
            TaskPatch::Description(description) => {
                map.insert("description".to_string(), json!(non_blank(description)));
            }
            TaskPatch::Importance(importance) => {
                map.insert("importance".to_string(), json!(importance));
            }
            TaskPatch::Urgency(urgency) => {
                map.insert("urgency".to_string(), json!(urgency));
            }
            TaskPatch::Classification {
                importance,
                urgency,
            } => {
                map.insert("importance".to_string(), json!(importance));
                map.insert("urgency".to_string(), json!(urgency));
            }
            TaskPatch::Assignee(assignee) => {
                map.insert("assignee".to_string(), json!(non_blank(assignee)));
            }
            TaskPatch::DueDate(due_date) => {
                map.insert("due_date".to_string(), json!(due_date));
            }
            TaskPatch::Tags(tags) => {
                map.insert("tags".to_string(), json!(tags));
            }
            TaskPatch::Position(position) => {
                map.insert("position".to_string(), json!(position));
            }
            TaskPatch::Placement {
                column_id,
                position,
            } => {
                map.insert("column_id".to_string(), json!(column_id));
                map.insert("position".to_string(), json!(position));
                map.insert("updated_at".to_string(), json!(Utc::now()));
            }
            TaskPatch::Details(draft) => {
                if let JsonValue::Object(row) = draft.insert_row(Uuid::nil(), 0) {
                    map = row;
                }
                map.remove("column_id");
                map.remove("position");
            }
        }
        map
    }

    fn apply_to(&self, row: &mut Task) {
        match self {
            TaskPatch::Title(title) => row.title = title.clone(),
            TaskPatch::Description(description) => row.description = description.clone(),
            TaskPatch::Importance(importance) => row.importance = *importance,
            TaskPatch::Urgency(urgency) => row.urgency = *urgency,
            TaskPatch::Classification {
                importance,
                urgency,
            } => {
                row.importance = *importance;
                row.urgency = *urgency;
            }
            TaskPatch::Assignee(assignee) => row.assignee = assignee.clone(),
            TaskPatch::DueDate(due_date) => row.due_date = *due_date,
            TaskPatch::Tags(tags) => row.tags = tags.clone(),
            TaskPatch::Position(position) => row.position = *position,
            TaskPatch::Placement {
                column_id,
                position,
            } => {
                row.column_id = *column_id;
                row.position = *position;
            }
            TaskPatch::Details(draft) => {
                row.title = draft.title.clone();
                row.description = draft.description.clone();
                row.importance = draft.importance;
                row.urgency = draft.urgency;
                row.assignee = draft.assignee.clone();
                row.due_date = draft.due_date;
                row.tags = draft.tags.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task::placeholder(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &TaskDraft::new("Write docs").with_tags(["docs"]),
            2,
        )
    }

    #[test]
    fn test_draft_requires_title() {
        assert!(TaskDraft::new("  ").validate().is_err());
        assert!(TaskDraft::new("X").validate().is_ok());
    }

    #[test]
    fn test_insert_row_blank_text_is_null() {
        let draft = TaskDraft::new("X").with_description("").with_assignee("  ");
        let row = draft.insert_row(Uuid::new_v4(), 0);
        assert!(row["description"].is_null());
        assert!(row["assignee"].is_null());
        assert_eq!(row["position"], 0);
    }

    #[test]
    fn test_reorder_row_sanitized() {
        let mut task = sample_task();
        task.description = Some(String::new());
        let row = task.reorder_row(5);

        assert_eq!(row["position"], 5);
        assert!(row["description"].is_null());
        assert!(row.get("created_at").is_none());
        assert!(row.get("updated_at").is_some());
        assert_eq!(row["tags"][0], "docs");
    }

    #[test]
    fn test_classification_patch_changes_exactly_two_fields() {
        let patch = TaskPatch::quadrant(Quadrant::UrgentNotImportant);
        let changes = patch.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["importance"], false);
        assert_eq!(changes["urgency"], true);
    }

    #[test]
    fn test_placement_patch_apply() {
        let mut task = sample_task();
        let target = Uuid::new_v4();
        TaskPatch::Placement {
            column_id: target,
            position: 0,
        }
        .apply_to(&mut task);
        assert_eq!(task.column_id, target);
        assert_eq!(task.position, 0);
    }

    #[test]
    fn test_details_patch_omits_placement_fields() {
        let patch = TaskPatch::Details(TaskDraft::new("Edited").important());
        let changes = patch.changes();
        assert!(!changes.contains_key("column_id"));
        assert!(!changes.contains_key("position"));
        assert_eq!(changes["title"], "Edited");
        assert_eq!(changes["importance"], true);
    }

    #[test]
    fn test_task_quadrant() {
        let mut task = sample_task();
        task.importance = true;
        assert_eq!(task.quadrant(), Quadrant::ImportantNotUrgent);
    }
}
