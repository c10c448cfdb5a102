//! In-memory store for tests and demos
//!
//! Implements the whole [`RemoteStore`] contract in process:
//!
//! - server-assigned ids and timestamps, column defaults
//! - cascade deletes from boards to columns to tasks
//! - change feeds with equality filters
//! - all-or-nothing batched upsert
//!
//! It also exposes knobs the hosted service does not have, so callers can
//! exercise their failure paths:
//!
//! - [`MemoryStore::fail_next`] / [`MemoryStore::fail_always`] inject store rejections
//! - [`MemoryStore::drop_column`] simulates a schema that predates a column
//! - [`MemoryStore::with_latency`] delays every call
//! - [`MemoryStore::writes`] returns the log of write calls
//!
//! # Example
//!
//! ```no_run
//! use taskboard_shared::store::{MemoryStore, Operation, RemoteStore, Table};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.fail_next(Operation::Insert, Some(Table::Boards), "boom").await;
//!
//! let result = store.insert(Table::Boards, vec![json!({"name": "x"})]).await;
//! assert!(result.is_err());
//! # Ok(())
//! # }
//! ```

use super::{
    json_text, ChangeEvent, ChangeKind, Filter, Query, RemoteStore, StoreError, StoreResult,
    Subscription, Table,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Store operation, for failure injection and the write log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
    Subscribe,
}

/// One write call as received by the store
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub operation: Operation,
    pub table: Table,

    /// Rows, patch (with `id`) or `{ "id": ... }` for deletes
    pub rows: Vec<JsonValue>,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    operation: Operation,
    table: Option<Table>,
    message: String,
    persistent: bool,
}

#[derive(Debug)]
struct Subscriber {
    table: Table,
    filter: Option<Filter>,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<JsonValue>>,
    dropped_columns: HashSet<(Table, String)>,
    failures: Vec<InjectedFailure>,
    writes: Vec<WriteRecord>,
    subscribers: Vec<Subscriber>,
}

/// In-memory [`RemoteStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`
    pub fn with_latency(latency: Duration) -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState::default()),
            latency: Some(latency),
        }
    }

    /// Loads rows without logging writes or notifying subscribers
    pub async fn seed(&self, table: Table, rows: Vec<JsonValue>) {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let rows: Vec<JsonValue> = rows
            .into_iter()
            .map(|row| with_defaults(table, row, now))
            .collect();
        state.tables.entry(table).or_default().extend(rows);
    }

    /// Snapshot of a table's rows in insertion order
    pub async fn rows(&self, table: Table) -> Vec<JsonValue> {
        let state = self.state.lock().await;
        state.tables.get(&table).cloned().unwrap_or_default()
    }

    /// Rejects the next matching call with `message`
    ///
    /// `table: None` matches any table.
    pub async fn fail_next(&self, operation: Operation, table: Option<Table>, message: impl Into<String>) {
        self.inject(operation, table, message.into(), false).await;
    }

    /// Rejects every matching call with `message` until cleared
    pub async fn fail_always(&self, operation: Operation, table: Option<Table>, message: impl Into<String>) {
        self.inject(operation, table, message.into(), true).await;
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    async fn inject(&self, operation: Operation, table: Option<Table>, message: String, persistent: bool) {
        self.state.lock().await.failures.push(InjectedFailure {
            operation,
            table,
            message,
            persistent,
        });
    }

    /// Simulates a schema without `column` on `table`
    pub async fn drop_column(&self, table: Table, column: impl Into<String>) {
        let column = column.into();
        let mut state = self.state.lock().await;
        if let Some(rows) = state.tables.get_mut(&table) {
            for row in rows.iter_mut() {
                if let Some(obj) = row.as_object_mut() {
                    obj.remove(&column);
                }
            }
        }
        state.dropped_columns.insert((table, column));
    }

    /// Log of write calls, oldest first
    pub async fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().await.writes.clone()
    }

    pub async fn clear_writes(&self) {
        self.state.lock().await.writes.clear();
    }

    /// Number of live subscriptions
    pub async fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.subscribers.retain(|s| !s.tx.is_closed());
        state.subscribers.len()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl MemoryState {
    fn take_failure(&mut self, operation: Operation, table: Table) -> Option<StoreError> {
        let index = self.failures.iter().position(|f| {
            f.operation == operation && f.table.map_or(true, |t| t == table)
        })?;
        let failure = if self.failures[index].persistent {
            self.failures[index].clone()
        } else {
            self.failures.remove(index)
        };
        tracing::debug!(
            operation = ?operation,
            table = %table,
            message = %failure.message,
            "Injected store failure"
        );
        Some(StoreError::rejected(failure.message))
    }

    fn check_columns(&self, table: Table, row: &JsonValue) -> StoreResult<()> {
        if let Some(obj) = row.as_object() {
            for key in obj.keys() {
                if self.dropped_columns.contains(&(table, key.clone())) {
                    return Err(StoreError::Rejected {
                        code: Some("PGRST204".to_string()),
                        message: format!(
                            "Could not find the '{}' column of '{}' in the schema cache",
                            key, table
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn strip_dropped(&self, table: Table, mut row: JsonValue) -> JsonValue {
        if let Some(obj) = row.as_object_mut() {
            obj.retain(|key, _| !self.dropped_columns.contains(&(table, key.clone())));
        }
        row
    }

    fn find(&self, table: Table, id: &str) -> Option<&JsonValue> {
        self.tables
            .get(&table)?
            .iter()
            .find(|row| row.get("id").and_then(json_text).as_deref() == Some(id))
    }

    fn matches(&self, table: Table, row: &JsonValue, filter: &Filter) -> bool {
        match filter {
            Filter::Eq { column, value } => {
                row.get(column).and_then(json_text).as_deref() == Some(value.as_str())
            }
            Filter::ParentEq {
                parent,
                column,
                value,
            } => {
                let Some((owner, foreign_key)) = table.owner() else {
                    return false;
                };
                if owner != *parent {
                    return false;
                }
                row.get(foreign_key)
                    .and_then(json_text)
                    .and_then(|owner_id| self.find(owner, &owner_id))
                    .and_then(|owner_row| owner_row.get(column))
                    .and_then(json_text)
                    .as_deref()
                    == Some(value.as_str())
            }
        }
    }

    fn publish(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|subscriber| {
            if subscriber.table != event.table || !event.matches(subscriber.filter.as_ref()) {
                return !subscriber.tx.is_closed();
            }
            subscriber.tx.send(event.clone()).is_ok()
        });
    }

    fn log(&mut self, operation: Operation, table: Table, rows: Vec<JsonValue>) {
        self.writes.push(WriteRecord {
            operation,
            table,
            rows,
        });
    }

    /// Removes a row and everything it owns, returning removed rows per table
    fn remove_cascade(&mut self, table: Table, id: &str) -> Vec<(Table, JsonValue)> {
        let mut removed = Vec::new();
        let Some(rows) = self.tables.get_mut(&table) else {
            return removed;
        };
        let Some(index) = rows
            .iter()
            .position(|row| row.get("id").and_then(json_text).as_deref() == Some(id))
        else {
            return removed;
        };
        removed.push((table, rows.remove(index)));

        for child in Table::ALL {
            let Some((owner, foreign_key)) = child.owner() else {
                continue;
            };
            if owner != table {
                continue;
            }
            let child_ids: Vec<String> = self
                .tables
                .get(&child)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| row.get(foreign_key).and_then(json_text).as_deref() == Some(id))
                        .filter_map(|row| row.get("id").and_then(json_text))
                        .collect()
                })
                .unwrap_or_default();
            for child_id in child_ids {
                removed.extend(self.remove_cascade(child, &child_id));
            }
        }
        removed
    }
}

/// Fills server-side defaults for a new row
fn with_defaults(table: Table, mut row: JsonValue, now: chrono::DateTime<Utc>) -> JsonValue {
    let Some(obj) = row.as_object_mut() else {
        return row;
    };
    obj.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
    obj.entry("created_at").or_insert_with(|| json!(now));
    obj.entry("updated_at").or_insert_with(|| json!(now));

    match table {
        Table::Boards => {
            obj.entry("position").or_insert(JsonValue::Null);
        }
        Table::Columns => {
            obj.entry("position").or_insert_with(|| json!(0));
        }
        Table::Tasks => {
            obj.entry("description").or_insert(JsonValue::Null);
            obj.entry("importance").or_insert_with(|| json!(false));
            obj.entry("urgency").or_insert_with(|| json!(false));
            obj.entry("assignee").or_insert(JsonValue::Null);
            obj.entry("due_date").or_insert(JsonValue::Null);
            obj.entry("tags").or_insert_with(|| json!([]));
            obj.entry("position").or_insert_with(|| json!(0));
        }
    }
    row
}

/// Orders JSON scalars: numbers numerically, everything else as text, nulls last
fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => json_text(a).cmp(&json_text(b)),
        },
    }
}

fn merge(target: &mut JsonValue, patch: &JsonValue) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select(&self, query: Query) -> StoreResult<Vec<JsonValue>> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Select, query.table) {
            return Err(err);
        }

        if let Some(order) = &query.order {
            if state
                .dropped_columns
                .contains(&(query.table, order.column.clone()))
            {
                return Err(StoreError::Rejected {
                    code: Some("42703".to_string()),
                    message: format!("column {}.{} does not exist", query.table, order.column),
                });
            }
        }

        let mut rows: Vec<JsonValue> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|filter| state.matches(query.table, row, filter))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_json(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Insert, table) {
            return Err(err);
        }
        for row in &rows {
            state.check_columns(table, row)?;
        }
        state.log(Operation::Insert, table, rows.clone());

        let now = Utc::now();
        let stored: Vec<JsonValue> = rows
            .into_iter()
            .map(|row| state.strip_dropped(table, with_defaults(table, row, now)))
            .collect();
        state
            .tables
            .entry(table)
            .or_default()
            .extend(stored.iter().cloned());

        for row in &stored {
            state.publish(ChangeEvent {
                table,
                kind: ChangeKind::Insert,
                new: Some(row.clone()),
                old: None,
            });
        }
        Ok(stored)
    }

    async fn update(&self, table: Table, id: Uuid, patch: JsonValue) -> StoreResult<JsonValue> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Update, table) {
            return Err(err);
        }
        state.check_columns(table, &patch)?;

        let id_text = id.to_string();
        let mut logged = patch.clone();
        merge(&mut logged, &json!({ "id": id_text }));
        state.log(Operation::Update, table, vec![logged]);

        let row = state
            .tables
            .get_mut(&table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(json_text).as_deref() == Some(id_text.as_str()))
            })
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id_text.clone(),
            })?;

        let old = row.clone();
        merge(row, &patch);
        if patch.get("updated_at").is_none() {
            merge(row, &json!({ "updated_at": Utc::now() }));
        }
        let new = row.clone();

        state.publish(ChangeEvent {
            table,
            kind: ChangeKind::Update,
            new: Some(new.clone()),
            old: Some(old),
        });
        Ok(new)
    }

    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<()> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Delete, table) {
            return Err(err);
        }
        state.log(Operation::Delete, table, vec![json!({ "id": id })]);

        for (removed_table, row) in state.remove_cascade(table, &id.to_string()) {
            state.publish(ChangeEvent {
                table: removed_table,
                kind: ChangeKind::Delete,
                new: None,
                old: Some(row),
            });
        }
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Upsert, table) {
            return Err(err);
        }
        for row in &rows {
            state.check_columns(table, row)?;
            if row.get("id").and_then(json_text).is_none() {
                return Err(StoreError::rejected(format!(
                    "upsert into {} requires an id on every row",
                    table
                )));
            }
        }
        state.log(Operation::Upsert, table, rows.clone());

        let now = Utc::now();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.get("id").and_then(json_text).unwrap_or_default();
            let existing = state.tables.get(&table).and_then(|rows| {
                rows.iter()
                    .position(|r| r.get("id").and_then(json_text).as_deref() == Some(id.as_str()))
            });
            let event = match existing {
                Some(index) => {
                    let current = &mut state.tables.entry(table).or_default()[index];
                    let old = current.clone();
                    merge(current, &row);
                    ChangeEvent {
                        table,
                        kind: ChangeKind::Update,
                        new: Some(current.clone()),
                        old: Some(old),
                    }
                }
                None => {
                    let new = state.strip_dropped(table, with_defaults(table, row, now));
                    state.tables.entry(table).or_default().push(new.clone());
                    ChangeEvent {
                        table,
                        kind: ChangeKind::Insert,
                        new: Some(new),
                        old: None,
                    }
                }
            };
            if let Some(new) = &event.new {
                stored.push(new.clone());
            }
            state.publish(event);
        }
        Ok(stored)
    }

    async fn subscribe(&self, table: Table, filter: Option<Filter>) -> StoreResult<Subscription> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.take_failure(Operation::Subscribe, table) {
            return Err(err);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.push(Subscriber { table, filter, tx });
        tracing::debug!(table = %table, "Memory store subscription opened");
        Ok(Subscription::new(table, rx))
    }
}
