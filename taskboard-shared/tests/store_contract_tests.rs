//! Store contract tests
//!
//! Exercises the typed helpers against the in-memory store the way the sync
//! layer uses them, plus the quadrant mapping every view depends on.

use serde_json::json;
use taskboard_shared::models::{
    default_column_rows, Board, Column, CreateBoard, Quadrant, Task, TaskDraft, TaskPatch,
};
use taskboard_shared::store::{typed, MemoryStore, Query, StoreError, Table};
use uuid::Uuid;

#[test]
fn test_classify_is_total() {
    let cases = [
        ((true, true), Quadrant::UrgentImportant),
        ((true, false), Quadrant::ImportantNotUrgent),
        ((false, true), Quadrant::UrgentNotImportant),
        ((false, false), Quadrant::Neither),
    ];
    for ((importance, urgency), expected) in cases {
        let quadrant = Quadrant::classify(importance, urgency);
        assert_eq!(quadrant, expected);
        assert_eq!(quadrant.flags(), (importance, urgency));
    }
}

#[tokio::test]
async fn test_board_lifecycle_cascades() {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();

    let board: Board = typed::insert_one(&store, CreateBoard::new("Work").insert_row(user_id, Some(0)))
        .await
        .unwrap();
    let columns: Vec<Column> = typed::insert_many(&store, default_column_rows(board.id))
        .await
        .unwrap();
    assert_eq!(columns.len(), 4);

    let task: Task = typed::insert_one(&store, TaskDraft::new("Ship it").insert_row(columns[0].id, 0))
        .await
        .unwrap();
    assert_eq!(task.column_id, columns[0].id);

    let by_board: Vec<Task> = typed::select(
        &store,
        Query::table(Table::Tasks).parent_eq(Table::Columns, "board_id", board.id),
    )
    .await
    .unwrap();
    assert_eq!(by_board, vec![task]);

    typed::delete::<Board>(&store, board.id).await.unwrap();
    assert!(store.rows(Table::Columns).await.is_empty());
    assert!(store.rows(Table::Tasks).await.is_empty());
}

#[tokio::test]
async fn test_patch_sends_only_changed_fields() {
    let store = MemoryStore::new();
    let task: Task = typed::insert_one(&store, TaskDraft::new("t").insert_row(Uuid::new_v4(), 3))
        .await
        .unwrap();
    store.clear_writes().await;

    let updated: Task = typed::update(&store, task.id, &TaskPatch::quadrant(Quadrant::UrgentImportant))
        .await
        .unwrap();
    assert!(updated.importance && updated.urgency);
    assert_eq!(updated.position, 3);

    let writes = store.writes().await;
    let sent = writes[0].rows[0].as_object().unwrap();
    let mut keys: Vec<_> = sent.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["id", "importance", "urgency"]);
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let store = MemoryStore::new();
    let result: Result<Task, StoreError> =
        typed::update(&store, Uuid::new_v4(), &TaskPatch::Title("x".to_string())).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_missing_column_is_reported_by_name() {
    let store = MemoryStore::new();
    store.drop_column(Table::Boards, "position").await;

    let err = typed::insert_one::<Board>(&store, json!({"user_id": Uuid::new_v4(), "name": "b", "position": 0}))
        .await
        .unwrap_err();
    assert!(err.mentions_column("position"));
}
