//! Board model
//!
//! A board is a named collection of columns belonging to one user. Boards are
//! created, renamed, reordered and deleted; deleting a board cascades to its
//! columns and tasks on the store side.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE boards (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES auth.users(id) ON DELETE CASCADE,
//!     name TEXT NOT NULL,
//!     position INTEGER,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `position` was added after the first schema version, so older deployments
//! may not have it. See [`crate::schema`].

use super::{FieldPatch, Record};
use crate::store::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

/// Board row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    /// Display name
    pub name: String,

    /// Ordering among the owner's boards (absent on older schemas)
    #[serde(default)]
    pub position: Option<i32>,

    /// When the board was created
    pub created_at: DateTime<Utc>,

    /// When the board was last updated
    pub updated_at: DateTime<Utc>,
}

impl Record for Board {
    const TABLE: Table = Table::Boards;

    fn id(&self) -> Uuid {
        self.id
    }

    fn position(&self) -> i32 {
        self.position.unwrap_or(0)
    }

    fn set_position(&mut self, position: i32) {
        self.position = Some(position);
    }
}

/// Input for creating a board
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBoard {
    /// Board name
    #[validate(length(min = 1, message = "board name is required"))]
    pub name: String,
}

impl CreateBoard {
    /// Creates board input, trimming the name
    pub fn new(name: impl Into<String>) -> Self {
        CreateBoard {
            name: name.into().trim().to_string(),
        }
    }

    /// Insert payload, with `position` only when the schema supports it
    pub fn insert_row(&self, user_id: Uuid, position: Option<i32>) -> JsonValue {
        let mut row = json!({
            "user_id": user_id,
            "name": self.name,
        });
        if let Some(position) = position {
            row["position"] = json!(position);
        }
        row
    }
}

/// Partial update for a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardPatch {
    /// Rename in place
    Rename(String),

    /// Move within the owner's board list
    Position(i32),
}

impl FieldPatch<Board> for BoardPatch {
    fn changes(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        match self {
            BoardPatch::Rename(name) => {
                map.insert("name".to_string(), json!(name));
            }
            BoardPatch::Position(position) => {
                map.insert("position".to_string(), json!(position));
            }
        }
        map
    }

    fn apply_to(&self, row: &mut Board) {
        match self {
            BoardPatch::Rename(name) => row.name = name.clone(),
            BoardPatch::Position(position) => row.position = Some(*position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_without_position_deserializes() {
        let row = json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "name": "Legacy",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        });
        let board: Board = serde_json::from_value(row).unwrap();
        assert_eq!(board.position, None);
        assert_eq!(board.position(), 0);
    }

    #[test]
    fn test_create_board_insert_row_optional_position() {
        let input = CreateBoard::new("  Work ");
        let user = Uuid::new_v4();

        let with = input.insert_row(user, Some(3));
        assert_eq!(with["name"], "Work");
        assert_eq!(with["position"], 3);

        let without = input.insert_row(user, None);
        assert!(without.get("position").is_none());
    }

    #[test]
    fn test_create_board_requires_name() {
        assert!(CreateBoard::new("   ").validate().is_err());
        assert!(CreateBoard::new("Home").validate().is_ok());
    }

    #[test]
    fn test_board_patch_changes() {
        let patch = BoardPatch::Rename("Renamed".to_string());
        let changes = patch.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["name"], "Renamed");
    }
}
