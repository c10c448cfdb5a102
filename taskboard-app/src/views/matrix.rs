//! Eisenhower matrix view
//!
//! Every task of the board lands in exactly one of four cells according to
//! its flags. The view also remembers which column each task came from, so a
//! drop on a cell can be turned into a [`DragResult`] for the controller.

use std::collections::HashMap;
use std::fmt;
use taskboard_shared::models::{Column, Quadrant, Task};
use taskboard_sync::aggregate::TaskMap;
use taskboard_sync::controller::{DragResult, DropTarget};
use uuid::Uuid;

/// One quadrant with its tasks
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCell<'a> {
    pub quadrant: Quadrant,
    pub tasks: Vec<&'a Task>,
}

impl MatrixCell<'_> {
    pub fn title(&self) -> &'static str {
        self.quadrant.title()
    }

    pub fn subtitle(&self) -> &'static str {
        self.quadrant.subtitle()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView<'a> {
    /// Cells in [`Quadrant::ALL`] order
    pub cells: Vec<MatrixCell<'a>>,
    column_of: HashMap<Uuid, Uuid>,
}

impl<'a> MatrixView<'a> {
    /// Groups tasks by quadrant, walking columns in position order
    pub fn build(columns: &[Column], tasks: &'a TaskMap) -> Self {
        let mut ordered: Vec<&Column> = columns.iter().collect();
        ordered.sort_by_key(|column| column.position);

        let mut cells: Vec<MatrixCell<'a>> = Quadrant::ALL
            .iter()
            .map(|&quadrant| MatrixCell {
                quadrant,
                tasks: Vec::new(),
            })
            .collect();
        let mut column_of = HashMap::new();

        for column in ordered {
            let Some(list) = tasks.get(&column.id) else {
                continue;
            };
            for task in list {
                column_of.insert(task.id, column.id);
                let quadrant = task.quadrant();
                if let Some(cell) = cells.iter_mut().find(|cell| cell.quadrant == quadrant) {
                    cell.tasks.push(task);
                }
            }
        }

        MatrixView { cells, column_of }
    }

    pub fn cell(&self, quadrant: Quadrant) -> Option<&MatrixCell<'a>> {
        self.cells.iter().find(|cell| cell.quadrant == quadrant)
    }

    /// Column a task belongs to
    pub fn column_of(&self, task_id: Uuid) -> Option<Uuid> {
        self.column_of.get(&task_id).copied()
    }

    /// Drag result for dropping a task on a quadrant
    ///
    /// Returns None for tasks not on the board.
    pub fn drop_on(&self, task_id: Uuid, quadrant: Quadrant) -> Option<DragResult> {
        let source = self
            .cells
            .iter()
            .find(|cell| cell.tasks.iter().any(|task| task.id == task_id))?
            .quadrant;
        Some(DragResult {
            task_id,
            source: DropTarget::Quadrant(source),
            destination: Some(DropTarget::Quadrant(quadrant)),
        })
    }
}

impl fmt::Display for MatrixView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            writeln!(f, "{} - {} ({})", cell.title(), cell.subtitle(), cell.tasks.len())?;
            for task in &cell.tasks {
                writeln!(f, "  - {}", task.title)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    fn titles(cell: &MatrixCell<'_>) -> Vec<String> {
        cell.tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_groups_demo_tasks_by_quadrant() {
        let (columns, tasks) = demo::board_state();
        let view = MatrixView::build(&columns, &tasks);

        assert_eq!(
            titles(view.cell(Quadrant::UrgentImportant).unwrap()),
            vec!["Fix critical bug in payment system"]
        );
        assert_eq!(
            titles(view.cell(Quadrant::ImportantNotUrgent).unwrap()),
            vec!["Design new landing page", "Set up development environment"]
        );
        assert_eq!(
            titles(view.cell(Quadrant::UrgentNotImportant).unwrap()),
            vec!["Update social media content"]
        );
        assert_eq!(titles(view.cell(Quadrant::Neither).unwrap()), vec!["Organize team meeting notes"]);
    }

    #[test]
    fn test_remembers_columns_and_builds_drops() {
        let (columns, tasks) = demo::board_state();
        let view = MatrixView::build(&columns, &tasks);
        let done = columns.iter().find(|c| c.title == "Done").unwrap();
        let task = &tasks[&done.id][0];

        assert_eq!(view.column_of(task.id), Some(done.id));
        let drag = view.drop_on(task.id, Quadrant::Neither).unwrap();
        assert_eq!(drag.source, DropTarget::Quadrant(Quadrant::ImportantNotUrgent));
        assert_eq!(drag.destination, Some(DropTarget::Quadrant(Quadrant::Neither)));
        assert!(view.drop_on(Uuid::new_v4(), Quadrant::Neither).is_none());
    }
}
