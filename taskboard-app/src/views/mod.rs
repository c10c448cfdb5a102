//! Presentation views
//!
//! Pure transforms from a board's columns and tasks to what a view shows.
//! None of them touch the store; edits go through the controller.
//!
//! - `kanban`: Columns in order with their tasks and counts
//! - `matrix`: Tasks grouped by Eisenhower quadrant
//! - `table`: One sortable row per task

pub mod kanban;
pub mod matrix;
pub mod table;

pub use kanban::{KanbanColumn, KanbanView};
pub use matrix::{MatrixCell, MatrixView};
pub use table::{SortDirection, SortField, SortState, TableRow, TableView};

use crate::preferences::ViewMode;
use taskboard_shared::models::Column;
use taskboard_sync::aggregate::TaskMap;

/// Renders a board in the given view mode as plain text
pub fn render(mode: ViewMode, columns: &[Column], tasks: &TaskMap) -> String {
    match mode {
        ViewMode::Kanban => KanbanView::build(columns, tasks).to_string(),
        ViewMode::Matrix => MatrixView::build(columns, tasks).to_string(),
        ViewMode::Table => TableView::build(columns, tasks, SortState::default()).to_string(),
    }
}
