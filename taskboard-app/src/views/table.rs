//! Table view
//!
//! Flattens the board into rows, one per task, with the owning column's
//! title as the status. Rows can be sorted by one field at a time; clicking
//! a header cycles that field through ascending, descending and unsorted.
//!
//! # Sort keys
//!
//! | field | compared as |
//! |---|---|
//! | title, status, assignee | lowercase text, missing assignee as empty |
//! | importance, urgency | flag (unset before set) |
//! | due date | date, missing dates first |

use std::cmp::Ordering;
use std::fmt;
use taskboard_shared::models::{Column, Quadrant, Task};
use taskboard_sync::aggregate::TaskMap;

/// Status shown for a task whose column is unknown
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Sortable column of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Status,
    Importance,
    Urgency,
    Assignee,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Current sort, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(SortField, SortDirection)>,
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        SortState {
            active: Some((field, direction)),
        }
    }

    pub fn field(&self) -> Option<SortField> {
        self.active.map(|(field, _)| field)
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.active.map(|(_, direction)| direction)
    }

    /// Header click: a new field sorts ascending, then descending, then off
    pub fn toggle(&mut self, field: SortField) {
        self.active = match self.active {
            Some((current, SortDirection::Asc)) if current == field => Some((field, SortDirection::Desc)),
            Some((current, SortDirection::Desc)) if current == field => None,
            _ => Some((field, SortDirection::Asc)),
        };
    }
}

/// One task with its status
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<'a> {
    pub task: &'a Task,
    pub status: &'a str,
}

impl TableRow<'_> {
    pub fn quadrant(&self) -> Quadrant {
        self.task.quadrant()
    }

    fn compare(&self, other: &Self, field: SortField) -> Ordering {
        match field {
            SortField::Title => lower(&self.task.title).cmp(&lower(&other.task.title)),
            SortField::Status => lower(self.status).cmp(&lower(other.status)),
            SortField::Importance => self.task.importance.cmp(&other.task.importance),
            SortField::Urgency => self.task.urgency.cmp(&other.task.urgency),
            SortField::Assignee => {
                let a = self.task.assignee.as_deref().map(lower).unwrap_or_default();
                let b = other.task.assignee.as_deref().map(lower).unwrap_or_default();
                a.cmp(&b)
            }
            SortField::DueDate => self.task.due_date.cmp(&other.task.due_date),
        }
    }
}

fn lower(s: &str) -> String {
    s.to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'a> {
    pub rows: Vec<TableRow<'a>>,
    pub sort: SortState,
}

impl<'a> TableView<'a> {
    /// Flattens tasks in column order, then applies the sort
    ///
    /// Ties keep their board order.
    pub fn build(columns: &'a [Column], tasks: &'a TaskMap, sort: SortState) -> Self {
        let mut ordered: Vec<&Column> = columns.iter().collect();
        ordered.sort_by_key(|column| column.position);

        let mut rows: Vec<TableRow<'a>> = ordered
            .into_iter()
            .flat_map(|column| {
                tasks
                    .get(&column.id)
                    .into_iter()
                    .flatten()
                    .map(move |task| TableRow {
                        task,
                        status: column.title.as_str(),
                    })
            })
            .collect();

        // Tasks whose column is not among `columns`
        for (column_id, list) in tasks {
            if !columns.iter().any(|c| c.id == *column_id) {
                rows.extend(list.iter().map(|task| TableRow {
                    task,
                    status: UNKNOWN_STATUS,
                }));
            }
        }

        if let Some((field, direction)) = sort.active {
            rows.sort_by(|a, b| {
                let ordering = a.compare(b, field);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        TableView { rows, sort }
    }
}

impl fmt::Display for TableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<36} {:<14} {:<4} {:<4} {:<14} {:<10}",
            "Title", "Status", "Imp", "Urg", "Assignee", "Due"
        )?;
        for row in &self.rows {
            let flag = |set: bool| if set { "yes" } else { "" };
            writeln!(
                f,
                "{:<36} {:<14} {:<4} {:<4} {:<14} {:<10}",
                row.task.title,
                row.status,
                flag(row.task.importance),
                flag(row.task.urgency),
                row.task.assignee.as_deref().unwrap_or(""),
                row.task
                    .due_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            )?;
        }
        Ok(())
    }
}
