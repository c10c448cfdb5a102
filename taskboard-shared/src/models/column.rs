//! Column model
//!
//! A column is an ordered stage within a board. `position` orders columns
//! within their board; it is not enforced unique by the store, so every
//! reorder rewrites a dense `0..n-1` sequence.

use super::{FieldPatch, Record};
use crate::store::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

/// Titles of the columns created for a new default board, in position order
pub const DEFAULT_COLUMN_TITLES: [&str; 4] = ["Backlog", "Next Up", "In Progress", "Complete"];

/// Column row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Unique column ID
    pub id: Uuid,

    /// Owning board
    pub board_id: Uuid,

    /// Display title
    pub title: String,

    /// Ordering within the board
    #[serde(default)]
    pub position: i32,

    /// When the column was created
    pub created_at: DateTime<Utc>,

    /// When the column was last updated
    pub updated_at: DateTime<Utc>,
}

impl Record for Column {
    const TABLE: Table = Table::Columns;

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

/// Input for creating a column
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateColumn {
    /// Column title
    #[validate(length(min = 1, message = "column title is required"))]
    pub title: String,
}

impl CreateColumn {
    /// Creates column input, trimming the title
    pub fn new(title: impl Into<String>) -> Self {
        CreateColumn {
            title: title.into().trim().to_string(),
        }
    }

    /// Insert payload for the given board and position
    pub fn insert_row(&self, board_id: Uuid, position: i32) -> JsonValue {
        json!({
            "board_id": board_id,
            "title": self.title,
            "position": position,
        })
    }
}

/// Insert payloads for the four default columns of a new board
pub fn default_column_rows(board_id: Uuid) -> Vec<JsonValue> {
    DEFAULT_COLUMN_TITLES
        .iter()
        .enumerate()
        .map(|(position, title)| CreateColumn::new(*title).insert_row(board_id, position as i32))
        .collect()
}

/// Partial update for a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPatch {
    /// Rename in place
    Rename(String),

    /// Move within the board
    Position(i32),
}

impl FieldPatch<Column> for ColumnPatch {
    fn changes(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        match self {
            ColumnPatch::Rename(title) => {
                map.insert("title".to_string(), json!(title));
            }
            ColumnPatch::Position(position) => {
                map.insert("position".to_string(), json!(position));
            }
        }
        map
    }

    fn apply_to(&self, row: &mut Column) {
        match self {
            ColumnPatch::Rename(title) => row.title = title.clone(),
            ColumnPatch::Position(position) => row.position = *position,
        }
    }
}
