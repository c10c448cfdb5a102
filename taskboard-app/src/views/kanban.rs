//! Kanban view: columns side by side, each with its ordered tasks

use std::fmt;
use taskboard_shared::models::{Column, Task};
use taskboard_sync::aggregate::TaskMap;
use uuid::Uuid;

/// One column of the board with its tasks
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn<'a> {
    pub column: &'a Column,
    pub tasks: &'a [Task],
}

impl KanbanColumn<'_> {
    /// Task count shown in the column header
    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

/// Board laid out as columns in position order
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanView<'a> {
    pub columns: Vec<KanbanColumn<'a>>,
}

impl<'a> KanbanView<'a> {
    /// Builds the view; columns without a task list render empty
    pub fn build(columns: &'a [Column], tasks: &'a TaskMap) -> Self {
        let mut ordered: Vec<&Column> = columns.iter().collect();
        ordered.sort_by_key(|column| column.position);

        let columns = ordered
            .into_iter()
            .map(|column| KanbanColumn {
                column,
                tasks: tasks.get(&column.id).map_or(&[], Vec::as_slice),
            })
            .collect();
        KanbanView { columns }
    }

    pub fn column(&self, column_id: Uuid) -> Option<&KanbanColumn<'a>> {
        self.columns.iter().find(|c| c.column.id == column_id)
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(KanbanColumn::count).sum()
    }
}

impl fmt::Display for KanbanView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in &self.columns {
            writeln!(f, "{} ({})", column.column.title, column.count())?;
            for task in column.tasks {
                write!(f, "  - {}", task.title)?;
                if let Some(assignee) = &task.assignee {
                    write!(f, " @{}", assignee)?;
                }
                if !task.tags.is_empty() {
                    write!(f, " [{}]", task.tags.join(", "))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn test_columns_in_position_order_with_counts() {
        let (columns, tasks) = demo::board_state();
        let mut shuffled = columns.clone();
        shuffled.reverse();

        let view = KanbanView::build(&shuffled, &tasks);
        let titles: Vec<_> = view.columns.iter().map(|c| c.column.title.as_str()).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Review", "Done"]);

        let counts: Vec<_> = view.columns.iter().map(KanbanColumn::count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1]);
        assert_eq!(view.total(), 5);
    }

    #[test]
    fn test_render_lists_tasks_under_headers() {
        let (columns, tasks) = demo::board_state();
        let rendered = KanbanView::build(&columns, &tasks).to_string();
        assert!(rendered.starts_with("To Do (2)\n  - Design new landing page @John Doe [design, frontend]\n"));
    }
}
