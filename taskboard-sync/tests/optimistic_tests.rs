//! Optimistic mutation tests for the board controller
//!
//! These run the controller against the in-memory store:
//! - Reorders write dense positions in one batch
//! - Cross-column moves and their inverse
//! - Rollback to the pre-edit copy on failure
//! - Drag-end routing for columns and quadrants

mod common;

use common::TestContext;
use serde_json::json;
use taskboard_shared::models::{Quadrant, Task, TaskDraft, TaskPatch};
use taskboard_shared::store::{Operation, Table};
use taskboard_sync::controller::{DragResult, DropTarget};
use taskboard_sync::notify::MutationKind;

fn drag(task: &Task, source: DropTarget, destination: DropTarget) -> DragResult {
    DragResult {
        task_id: task.id,
        source,
        destination: Some(destination),
    }
}

#[tokio::test]
async fn test_drag_last_to_first_writes_one_dense_batch() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let tasks = ctx.add_tasks(column, &["A", "B", "C"]).await;
    ctx.store.clear_writes().await;

    ctx.controller
        .handle_drag_end(drag(
            &tasks[2],
            DropTarget::Column { column_id: column, index: 2 },
            DropTarget::Column { column_id: column, index: 0 },
        ))
        .await
        .unwrap();

    assert_eq!(ctx.titles(column), vec!["C", "A", "B"]);
    let positions: Vec<i32> = ctx.controller.tasks_in(column).iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let writes = ctx.store.writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].operation, Operation::Upsert);
    let pairs: Vec<_> = writes[0]
        .rows
        .iter()
        .map(|row| (row["id"].clone(), row["position"].clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (json!(tasks[2].id), json!(0)),
            (json!(tasks[0].id), json!(1)),
            (json!(tasks[1].id), json!(2)),
        ]
    );
    assert!(writes[0].rows.iter().all(|row| row.get("created_at").is_none()));
}

async fn stored_positions(ctx: &TestContext, tasks: &[Task]) -> Vec<i64> {
    let stored = ctx.store.rows(Table::Tasks).await;
    tasks
        .iter()
        .map(|task| {
            let row = stored.iter().find(|r| r["id"] == json!(task.id)).unwrap();
            row["position"].as_i64().unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_position_patch_rewrites_column_densely() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let tasks = ctx.add_tasks(column, &["A", "B", "C"]).await;
    ctx.store.clear_writes().await;

    ctx.controller
        .update_task(tasks[2].id, TaskPatch::Position(0))
        .await
        .unwrap();

    assert_eq!(ctx.titles(column), vec!["C", "A", "B"]);
    let positions: Vec<i32> = ctx.controller.tasks_in(column).iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let writes = ctx.store.writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].operation, Operation::Upsert);
    let new_order = [tasks[2].clone(), tasks[0].clone(), tasks[1].clone()];
    assert_eq!(stored_positions(&ctx, &new_order).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_placement_in_same_column_is_a_reorder() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Next Up");
    let tasks = ctx.add_tasks(column, &["A", "B", "C"]).await;

    ctx.controller
        .update_task(
            tasks[0].id,
            TaskPatch::Placement {
                column_id: column,
                position: 7,
            },
        )
        .await
        .unwrap();

    assert_eq!(ctx.titles(column), vec!["B", "C", "A"]);
    let positions: Vec<i32> = ctx.controller.tasks_in(column).iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    let new_order = [tasks[1].clone(), tasks[2].clone(), tasks[0].clone()];
    assert_eq!(stored_positions(&ctx, &new_order).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_failed_position_patch_reverts_and_returns_error() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let tasks = ctx.add_tasks(column, &["A", "B", "C"]).await;
    ctx.store.fail_next(Operation::Upsert, Some(Table::Tasks), "batch rejected").await;

    let result = ctx.controller.update_task(tasks[2].id, TaskPatch::Position(0)).await;
    assert!(result.is_err());
    assert_eq!(ctx.titles(column), vec!["A", "B", "C"]);
    assert_eq!(ctx.notices.try_recv().unwrap().action, MutationKind::Move);
}

#[tokio::test]
async fn test_whitespace_title_draft_is_not_created() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    ctx.store.clear_writes().await;
    let draft: TaskDraft = serde_json::from_value(json!({"title": "   "})).unwrap();

    assert!(ctx.controller.create_task(column, draft).await.is_none());
    assert!(ctx.controller.tasks_in(column).is_empty());
    assert!(ctx.store.rows(Table::Tasks).await.is_empty());
    assert!(ctx.store.writes().await.is_empty());
    assert!(ctx.notices.try_recv().is_err());
}

#[tokio::test]
async fn test_reorder_to_current_order_writes_existing_sequence() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Next Up");
    let tasks = ctx.add_tasks(column, &["A", "B", "C"]).await;
    ctx.store.clear_writes().await;

    let cache = ctx.controller.registry().get(column).unwrap();
    let current = cache.tasks().to_vec();
    let mut cache = taskboard_sync::cache::TaskCache::new(ctx.aggregate.store(), column);
    cache.seed(current.clone());
    cache.reorder(current).await.unwrap();

    let writes = ctx.store.writes().await;
    assert_eq!(writes.len(), 1);
    let written: Vec<_> = writes[0]
        .rows
        .iter()
        .map(|row| (row["id"].clone(), row["position"].clone()))
        .collect();
    let expected: Vec<_> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (json!(t.id), json!(i)))
        .collect();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_move_there_and_back_restores_both_columns() {
    let mut ctx = TestContext::new().await.unwrap();
    let a = ctx.column("Backlog");
    let b = ctx.column("Next Up");
    let moving = ctx.add_tasks(a, &["a0", "a1", "a2"]).await[1].clone();
    ctx.add_tasks(b, &["b0", "b1"]).await;

    let before_a = ctx.ids(a);
    let before_b = ctx.ids(b);

    ctx.controller.move_across_columns(moving.id, b, 1).await.unwrap();
    assert_eq!(ctx.titles(a), vec!["a0", "a2"]);
    assert_eq!(ctx.titles(b), vec!["b0", "a1", "b1"]);

    ctx.controller.move_across_columns(moving.id, a, 1).await.unwrap();
    assert_eq!(ctx.ids(a), before_a);
    assert_eq!(ctx.ids(b), before_b);
}

#[tokio::test]
async fn test_cross_column_drag_into_empty_column() {
    let mut ctx = TestContext::new().await.unwrap();
    let in_progress = ctx.column("In Progress");
    let done = ctx.column("Complete");
    let tasks = ctx.add_tasks(in_progress, &["first", "second"]).await;

    ctx.controller
        .handle_drag_end(drag(
            &tasks[1],
            DropTarget::Column { column_id: in_progress, index: 1 },
            DropTarget::Column { column_id: done, index: 0 },
        ))
        .await
        .unwrap();

    assert_eq!(ctx.controller.tasks_in(in_progress).len(), 1);
    assert_eq!(ctx.controller.tasks_in(done).len(), 1);
    assert_eq!(ctx.controller.tasks_in(done)[0].column_id, done);
    assert_eq!(ctx.controller.column_of(tasks[1].id), Some(done));

    let stored = ctx.store.rows(Table::Tasks).await;
    let row = stored.iter().find(|r| r["id"] == json!(tasks[1].id)).unwrap();
    assert_eq!(row["column_id"], json!(done));
}

#[tokio::test]
async fn test_failed_move_reverts_and_notifies() {
    let mut ctx = TestContext::new().await.unwrap();
    let source = ctx.column("Backlog");
    let dest = ctx.column("Complete");
    let task = ctx.add_tasks(source, &["t"]).await.remove(0);
    let before = ctx.controller.working().clone();

    ctx.store.fail_next(Operation::Update, Some(Table::Tasks), "network down").await;
    let result = ctx.controller.move_across_columns(task.id, dest, 0).await;

    assert!(result.is_err());
    assert_eq!(ctx.controller.working(), &before);
    let notice = ctx.notices.try_recv().unwrap();
    assert_eq!(notice.action, MutationKind::Move);
    assert_eq!(notice.message, "Failed to move task. Please try again.");
}

#[tokio::test]
async fn test_failed_reorder_reverts_and_notifies() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    ctx.add_tasks(column, &["A", "B"]).await;

    ctx.store.fail_next(Operation::Upsert, Some(Table::Tasks), "timeout").await;
    assert!(!ctx.controller.reorder_within_column(column, 1, 0).await);

    assert_eq!(ctx.titles(column), vec!["A", "B"]);
    assert_eq!(ctx.notices.try_recv().unwrap().action, MutationKind::Move);
}

#[tokio::test]
async fn test_failed_edit_equals_pre_edit_copy() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let task = ctx.add_tasks(column, &["original"]).await.remove(0);
    let before = ctx.controller.working().clone();

    ctx.store.fail_always(Operation::Update, Some(Table::Tasks), "read only").await;
    let edit = TaskDraft::new("edited").important().with_assignee("Jane");
    assert!(ctx.controller.update_task(task.id, TaskPatch::Details(edit)).await.is_err());
    assert_eq!(ctx.controller.working(), &before);

    assert!(ctx
        .controller
        .move_to_quadrant(task.id, Quadrant::UrgentImportant)
        .await
        .is_err());
    assert_eq!(ctx.controller.working(), &before);
    assert_eq!(ctx.notices.try_recv().unwrap().action, MutationKind::Update);
    assert_eq!(ctx.notices.try_recv().unwrap().action, MutationKind::Update);
}

#[tokio::test]
async fn test_quadrant_drop_updates_flags_only() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let task = ctx.add_tasks(column, &["t"]).await.remove(0);
    ctx.store.clear_writes().await;

    ctx.controller
        .handle_drag_end(drag(
            &task,
            DropTarget::Quadrant(Quadrant::Neither),
            DropTarget::Quadrant(Quadrant::UrgentNotImportant),
        ))
        .await
        .unwrap();

    let updated = ctx.controller.find_task(task.id).unwrap();
    assert_eq!(updated.quadrant(), Quadrant::UrgentNotImportant);
    assert_eq!(updated.column_id, column);

    let writes = ctx.store.writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].operation, Operation::Update);
    assert_eq!(writes[0].rows[0]["importance"], json!(false));
    assert_eq!(writes[0].rows[0]["urgency"], json!(true));
}

#[tokio::test]
async fn test_quadrant_source_to_column_resolves_current_column() {
    let mut ctx = TestContext::new().await.unwrap();
    let backlog = ctx.column("Backlog");
    let next = ctx.column("Next Up");
    let task = ctx.add_tasks(backlog, &["t"]).await.remove(0);

    ctx.controller
        .handle_drag_end(drag(
            &task,
            DropTarget::Quadrant(Quadrant::Neither),
            DropTarget::Column { column_id: next, index: 0 },
        ))
        .await
        .unwrap();
    assert_eq!(ctx.controller.column_of(task.id), Some(next));
}

#[tokio::test]
async fn test_unknown_task_and_column_are_ignored() {
    let mut ctx = TestContext::new().await.unwrap();
    let column = ctx.column("Backlog");
    let task = ctx.add_tasks(column, &["t"]).await.remove(0);
    ctx.store.clear_writes().await;

    let ghost = uuid::Uuid::new_v4();
    ctx.controller
        .update_task(ghost, TaskPatch::Title("x".to_string()))
        .await
        .unwrap();
    ctx.controller.move_across_columns(task.id, ghost, 0).await.unwrap();
    assert!(ctx.controller.create_task(ghost, TaskDraft::new("x")).await.is_none());

    assert!(ctx.store.writes().await.is_empty());
    assert!(ctx.notices.try_recv().is_err());
}
