//! Row models for the three remote tables
//!
//! Each model mirrors one table of the hosted data service and implements
//! [`Record`] so the entity caches can treat boards, columns and tasks
//! uniformly.
//!
//! # Models
//!
//! - `board`: Named collection of columns owned by one user
//! - `column`: Ordered stage within a board
//! - `task`: Work item classified by importance and urgency
//! - `quadrant`: Eisenhower quadrant derived from a task's flags

pub mod board;
pub mod column;
pub mod quadrant;
pub mod task;

pub use board::{Board, BoardPatch, CreateBoard};
pub use column::{default_column_rows, Column, ColumnPatch, CreateColumn, DEFAULT_COLUMN_TITLES};
pub use quadrant::Quadrant;
pub use task::{Task, TaskDraft, TaskPatch};

use crate::store::Table;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// A row type stored in one of the remote tables
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table the row lives in
    const TABLE: Table;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Ordering key within the owning scope
    fn position(&self) -> i32;

    /// Overwrites the ordering key
    fn set_position(&mut self, position: i32);
}

/// A partial update for a [`Record`]
///
/// Patches are closed enums so only meaningful field combinations can be
/// sent to the store.
pub trait FieldPatch<R: Record> {
    /// The changed columns, keyed by column name
    fn changes(&self) -> Map<String, JsonValue>;

    /// Applies the change to a local copy of the row
    fn apply_to(&self, row: &mut R);
}

/// Returns the next free position for a scope: `max + 1`, or `0` when empty
pub fn next_position<R: Record>(rows: &[R]) -> i32 {
    rows.iter().map(|row| row.position()).max().map_or(0, |max| max + 1)
}

/// Stable sort by position; ties keep their existing relative order
pub fn sort_by_position<R: Record>(rows: &mut [R]) {
    rows.sort_by_key(|row| row.position());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn column(title: &str, position: i32) -> Column {
        let now = Utc::now();
        Column {
            id: Uuid::new_v4(),
            board_id: Uuid::nil(),
            title: title.to_string(),
            position,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_next_position_empty() {
        let rows: Vec<Column> = vec![];
        assert_eq!(next_position(&rows), 0);
    }

    #[test]
    fn test_next_position_uses_max_not_len() {
        let rows = vec![column("a", 0), column("b", 7), column("c", 2)];
        assert_eq!(next_position(&rows), 8);
    }

    #[test]
    fn test_sort_by_position_is_stable() {
        let mut rows = vec![column("b", 1), column("a1", 0), column("a2", 0)];
        sort_by_position(&mut rows);
        let titles: Vec<_> = rows.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b"]);
    }
}
