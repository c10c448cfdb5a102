//! Board view controller
//!
//! The controller owns the working copy of a board's tasks. Every intent
//! (create, edit, delete, drag) is applied to the working copy first, then
//! sent through the column's [`TaskCache`](crate::cache::TaskCache).
//!
//! # Known-good copy
//!
//! Next to the working copy the controller keeps the last state the store
//! has confirmed. Mutations run one at a time (`&mut self`), so before each
//! one the two copies are equal:
//!
//! - confirmed: the known-good copy becomes the working copy
//! - failed: the working copy is reset to the known-good copy, which is
//!   exactly the state before the edit, and a notice is raised
//!
//! # Snapshots
//!
//! Snapshots from the aggregate carry the clock value taken when their fetch
//! started. A snapshot whose fetch started before the last confirmed local
//! write may not contain that write yet; such a snapshot is ignored and the
//! next refresh brings the store state in.
//!
//! Unknown tasks and columns are silently ignored throughout.

use crate::aggregate::{BoardAggregate, BoardSnapshot, TaskMap};
use crate::cache::{splice, validate_draft, TaskCacheRegistry};
use crate::clock::RevisionClock;
use crate::notify::{MutationKind, Notice, Notifier};
use crate::{SyncError, SyncResult};
use std::sync::Arc;
use taskboard_shared::models::{next_position, Column, FieldPatch, Quadrant, Task, TaskDraft, TaskPatch};
use taskboard_shared::store::RemoteStore;
use uuid::Uuid;

/// Where a dragged task was picked up or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A column list at an index
    Column { column_id: Uuid, index: usize },

    /// A matrix quadrant
    Quadrant(Quadrant),
}

/// Outcome of a drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    pub task_id: Uuid,
    pub source: DropTarget,

    /// None when the task was dropped outside any target
    pub destination: Option<DropTarget>,
}

/// Working copy of one board's tasks
pub struct BoardController {
    notifier: Arc<dyn Notifier>,
    clock: Arc<RevisionClock>,
    registry: TaskCacheRegistry,
    columns: Vec<Column>,
    working: TaskMap,
    known_good: TaskMap,
    last_confirmed: u64,
    add_dialog: Option<Uuid>,
}

impl BoardController {
    /// Creates an empty controller
    ///
    /// # Arguments
    ///
    /// * `store` - Store the task caches write to
    /// * `notifier` - Receives failure notices
    /// * `clock` - Clock shared with the aggregate producing snapshots
    pub fn new(store: Arc<dyn RemoteStore>, notifier: Arc<dyn Notifier>, clock: Arc<RevisionClock>) -> Self {
        BoardController {
            registry: TaskCacheRegistry::new(store),
            notifier,
            clock,
            columns: Vec::new(),
            working: TaskMap::new(),
            known_good: TaskMap::new(),
            last_confirmed: 0,
            add_dialog: None,
        }
    }

    /// Creates a controller sharing an aggregate's store and clock
    pub fn from_aggregate(aggregate: &BoardAggregate, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(aggregate.store(), notifier, aggregate.clock())
    }

    /// Columns of the adopted snapshot, in position order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The working copy, column id to ordered tasks
    pub fn working(&self) -> &TaskMap {
        &self.working
    }

    pub fn tasks_in(&self, column_id: Uuid) -> &[Task] {
        self.working.get(&column_id).map_or(&[], Vec::as_slice)
    }

    pub fn find_task(&self, task_id: Uuid) -> Option<&Task> {
        self.working.values().flatten().find(|task| task.id == task_id)
    }

    /// Column currently holding a task in the working copy
    pub fn column_of(&self, task_id: Uuid) -> Option<Uuid> {
        self.locate(task_id).map(|(column_id, _)| column_id)
    }

    pub fn registry(&self) -> &TaskCacheRegistry {
        &self.registry
    }

    /// Opens the add-task dialog for a column
    pub fn open_add_task(&mut self, column_id: Uuid) {
        if self.working.contains_key(&column_id) {
            self.add_dialog = Some(column_id);
        }
    }

    pub fn close_add_task(&mut self) {
        self.add_dialog = None;
    }

    /// Column the add-task dialog is open for
    pub fn add_task_column(&self) -> Option<Uuid> {
        self.add_dialog
    }

    /// Adopts a snapshot unless it predates the last confirmed write
    ///
    /// Returns whether the snapshot was adopted.
    pub fn sync_from_snapshot(&mut self, snapshot: &BoardSnapshot) -> bool {
        if snapshot.revision <= self.last_confirmed {
            tracing::debug!(
                revision = snapshot.revision,
                last_confirmed = self.last_confirmed,
                "Ignoring snapshot older than confirmed write"
            );
            return false;
        }

        self.columns = snapshot.columns.clone();
        let mut tasks = snapshot.tasks.clone();
        for column in &self.columns {
            tasks.entry(column.id).or_default();
        }
        self.registry.sync(&self.columns, &tasks);
        self.known_good = tasks.clone();
        self.working = tasks;

        if self
            .add_dialog
            .is_some_and(|column_id| !self.working.contains_key(&column_id))
        {
            self.add_dialog = None;
        }
        true
    }

    /// Creates a task at the end of a column
    ///
    /// A placeholder with a temporary id shows up immediately and is swapped
    /// for the stored task on success. A blank title sends nothing and
    /// returns `None` without a notice.
    pub async fn create_task(&mut self, column_id: Uuid, draft: TaskDraft) -> Option<Task> {
        if !self.working.contains_key(&column_id) {
            return None;
        }
        if let Err(err) = validate_draft(&draft) {
            tracing::warn!(column_id = %column_id, error = %err, "Task draft rejected");
            return None;
        }
        self.close_add_task();

        let temp_id = Uuid::new_v4();
        let list = self.working.entry(column_id).or_default();
        let placeholder = Task::placeholder(temp_id, column_id, &draft, next_position(list));
        list.push(placeholder);

        let result = match self.registry.get_mut(column_id) {
            Some(cache) => cache.create(&draft).await,
            None => return self.discard_placeholder(column_id, temp_id),
        };

        match result {
            Ok(task) => {
                let list = self.working.entry(column_id).or_default();
                match list.iter_mut().find(|task| task.id == temp_id) {
                    Some(slot) => *slot = task.clone(),
                    None => list.push(task.clone()),
                }
                self.confirm();
                tracing::info!(task_id = %task.id, column_id = %column_id, "Task created");
                Some(task)
            }
            Err(err) => {
                self.roll_back(MutationKind::Create, &err);
                None
            }
        }
    }

    fn discard_placeholder(&mut self, column_id: Uuid, temp_id: Uuid) -> Option<Task> {
        if let Some(list) = self.working.get_mut(&column_id) {
            list.retain(|task| task.id != temp_id);
        }
        None
    }

    /// Applies a patch to a task
    ///
    /// A placement in another column is handled as a cross-column move; a
    /// position change (or a placement in the task's own column) rewrites
    /// the whole column as a reorder.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Invalid`] for an edit with a blank title (nothing is
    ///   applied or sent)
    /// - the store error, after the working copy is reset and a notice raised
    pub async fn update_task(&mut self, task_id: Uuid, patch: TaskPatch) -> SyncResult<()> {
        let Some((column_id, index)) = self.locate(task_id) else {
            return Ok(());
        };

        match &patch {
            TaskPatch::Placement {
                column_id: dest,
                position,
            } if *dest != column_id => {
                return self.move_across_columns(task_id, *dest, target_index(*position)).await;
            }
            TaskPatch::Placement { position, .. } | TaskPatch::Position(position) => {
                return self
                    .reorder(column_id, index, target_index(*position))
                    .await
                    .map(|_| ());
            }
            TaskPatch::Title(title) if title.trim().is_empty() => {
                return Err(SyncError::Invalid("task title is required".to_string()));
            }
            TaskPatch::Details(draft) => validate_draft(draft)?,
            _ => {}
        }

        if let Some(list) = self.working.get_mut(&column_id) {
            patch.apply_to(&mut list[index]);
        }

        let result = match self.registry.get_mut(column_id) {
            Some(cache) => cache.update(task_id, &patch).await,
            None => Err(SyncError::Invalid(format!("no cache for column {}", column_id))),
        };

        match result {
            Ok(stored) => {
                self.replace_task(column_id, stored);
                self.confirm();
                tracing::debug!(task_id = %task_id, "Task updated");
                Ok(())
            }
            Err(err) => {
                self.roll_back(MutationKind::Update, &err);
                Err(err)
            }
        }
    }

    /// Deletes a task; returns whether the store confirmed the delete
    pub async fn delete_task(&mut self, task_id: Uuid) -> bool {
        let Some((column_id, index)) = self.locate(task_id) else {
            return false;
        };
        if let Some(list) = self.working.get_mut(&column_id) {
            list.remove(index);
        }

        let result = match self.registry.get_mut(column_id) {
            Some(cache) => cache.delete(task_id).await,
            None => Err(SyncError::Invalid(format!("no cache for column {}", column_id))),
        };

        match result {
            Ok(()) => {
                self.confirm();
                tracing::info!(task_id = %task_id, column_id = %column_id, "Task deleted");
                true
            }
            Err(err) => {
                self.roll_back(MutationKind::Delete, &err);
                false
            }
        }
    }

    /// Moves a task within its column and rewrites the column's positions
    ///
    /// Returns true when the new order was persisted. Out-of-range sources
    /// and drops onto the same index write nothing.
    pub async fn reorder_within_column(&mut self, column_id: Uuid, from: usize, to: usize) -> bool {
        self.reorder(column_id, from, to).await.unwrap_or(false)
    }

    /// Splices, writes dense positions in one batch and confirms or rolls back
    ///
    /// `Ok(false)` when nothing needed writing.
    async fn reorder(&mut self, column_id: Uuid, from: usize, to: usize) -> SyncResult<bool> {
        let Some(list) = self.working.get(&column_id) else {
            return Ok(false);
        };
        if from >= list.len() || from == to.min(list.len() - 1) {
            return Ok(false);
        }

        let mut ordered = list.clone();
        splice(&mut ordered, from, to);
        for (index, task) in ordered.iter_mut().enumerate() {
            task.position = index as i32;
        }
        self.working.insert(column_id, ordered.clone());

        let result = match self.registry.get_mut(column_id) {
            Some(cache) => cache.reorder(ordered).await,
            None => Err(SyncError::Invalid(format!("no cache for column {}", column_id))),
        };

        match result {
            Ok(()) => {
                self.confirm();
                tracing::debug!(column_id = %column_id, from, to, "Column reordered");
                Ok(true)
            }
            Err(err) => {
                self.roll_back(MutationKind::Move, &err);
                Err(err)
            }
        }
    }

    /// Moves a task into another column at an index
    ///
    /// The task is sent with `position = index`. A destination equal to the
    /// task's column is a reorder.
    ///
    /// # Errors
    ///
    /// Returns the store error after the working copy is reset and a notice
    /// raised.
    pub async fn move_across_columns(&mut self, task_id: Uuid, dest_column: Uuid, dest_index: usize) -> SyncResult<()> {
        let Some((source_column, from)) = self.locate(task_id) else {
            return Ok(());
        };
        if !self.working.contains_key(&dest_column) {
            return Ok(());
        }
        if source_column == dest_column {
            self.reorder_within_column(source_column, from, dest_index).await;
            return Ok(());
        }

        let Some(mut task) = self.working.get_mut(&source_column).map(|list| list.remove(from)) else {
            return Ok(());
        };
        let dest = self.working.entry(dest_column).or_default();
        let index = dest_index.min(dest.len());
        task.column_id = dest_column;
        task.position = index as i32;
        dest.insert(index, task);

        let result = match self.registry.get_mut(source_column) {
            Some(cache) => cache.move_to(task_id, dest_column, index as i32).await,
            None => Err(SyncError::Invalid(format!("no cache for column {}", source_column))),
        };

        match result {
            Ok(stored) => {
                if let Some(cache) = self.registry.get_mut(dest_column) {
                    cache.accept(stored.clone());
                }
                self.replace_task(dest_column, stored);
                self.confirm();
                tracing::debug!(
                    task_id = %task_id,
                    from_column = %source_column,
                    to_column = %dest_column,
                    index,
                    "Task moved across columns"
                );
                Ok(())
            }
            Err(err) => {
                self.roll_back(MutationKind::Move, &err);
                Err(err)
            }
        }
    }

    /// Puts a task into a quadrant by updating its two flags
    ///
    /// Dropping a task onto the quadrant it is already in does nothing.
    pub async fn move_to_quadrant(&mut self, task_id: Uuid, quadrant: Quadrant) -> SyncResult<()> {
        match self.find_task(task_id) {
            Some(task) if task.quadrant() != quadrant => {
                self.update_task(task_id, TaskPatch::quadrant(quadrant)).await
            }
            _ => Ok(()),
        }
    }

    /// Routes the end of a drag gesture
    ///
    /// | destination | action |
    /// |---|---|
    /// | none, or the source itself | nothing |
    /// | quadrant | [`move_to_quadrant`](Self::move_to_quadrant) |
    /// | the task's own column | [`reorder_within_column`](Self::reorder_within_column) |
    /// | another column | [`move_across_columns`](Self::move_across_columns) |
    ///
    /// Reorder failures are reported through the notifier only.
    pub async fn handle_drag_end(&mut self, drag: DragResult) -> SyncResult<()> {
        let Some(destination) = drag.destination else {
            return Ok(());
        };
        if destination == drag.source {
            return Ok(());
        }

        match destination {
            DropTarget::Quadrant(quadrant) => self.move_to_quadrant(drag.task_id, quadrant).await,
            DropTarget::Column { column_id, index } => match self.locate(drag.task_id) {
                Some((current, from)) if current == column_id => {
                    self.reorder_within_column(column_id, from, index).await;
                    Ok(())
                }
                Some(_) => self.move_across_columns(drag.task_id, column_id, index).await,
                None => Ok(()),
            },
        }
    }

    fn locate(&self, task_id: Uuid) -> Option<(Uuid, usize)> {
        self.working.iter().find_map(|(column_id, tasks)| {
            tasks
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (*column_id, index))
        })
    }

    fn replace_task(&mut self, column_id: Uuid, stored: Task) {
        if let Some(slot) = self
            .working
            .get_mut(&column_id)
            .and_then(|list| list.iter_mut().find(|task| task.id == stored.id))
        {
            *slot = stored;
        }
    }

    fn confirm(&mut self) {
        self.known_good = self.working.clone();
        self.last_confirmed = self.clock.tick();
    }

    fn roll_back(&mut self, action: MutationKind, err: &SyncError) {
        tracing::warn!(action = %action, error = %err, "Task mutation failed, reverting");
        self.working = self.known_good.clone();
        self.notifier.notify(Notice::failure(action, Some(err.to_string())));
    }
}

/// List index for a requested position; negative positions mean the front
fn target_index(position: i32) -> usize {
    usize::try_from(position).unwrap_or(0)
}
