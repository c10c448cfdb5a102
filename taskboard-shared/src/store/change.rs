//! Change notifications
//!
//! A [`Subscription`] delivers one [`ChangeEvent`] per insert, update or
//! delete affecting rows that match the subscription's table and filter.
//! Dropping the subscription (or calling [`Subscription::unsubscribe`])
//! detaches it from the store without affecting other subscriptions.

use super::{json_text, Filter, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,

    /// Row after the change (absent for deletes)
    pub new: Option<JsonValue>,

    /// Row before the change (absent for inserts)
    pub old: Option<JsonValue>,
}

impl ChangeEvent {
    /// Value of a column on the new row, falling back to the old row
    pub fn field(&self, column: &str) -> Option<String> {
        self.new
            .as_ref()
            .and_then(|row| row.get(column))
            .and_then(json_text)
            .or_else(|| {
                self.old
                    .as_ref()
                    .and_then(|row| row.get(column))
                    .and_then(json_text)
            })
    }

    /// Whether the event passes an equality filter
    ///
    /// Owner filters cannot be evaluated on a bare event and always pass.
    pub fn matches(&self, filter: Option<&Filter>) -> bool {
        match filter {
            None => true,
            Some(Filter::Eq { column, value }) => {
                let hit = |row: &Option<JsonValue>| {
                    row.as_ref()
                        .and_then(|r| r.get(column))
                        .and_then(json_text)
                        .is_some_and(|v| &v == value)
                };
                hit(&self.new) || hit(&self.old)
            }
            Some(Filter::ParentEq { .. }) => true,
        }
    }
}

/// Live change feed for one table
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    table: Table,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    /// Wraps the receiving end of a store's change channel
    pub fn new(table: Table, events: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Subscription {
            id: Uuid::new_v4(),
            table,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Waits for the next event; `None` once the store closed the feed
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Detaches from the store
    pub fn unsubscribe(mut self) {
        self.events.close();
        tracing::debug!(subscription_id = %self.id, table = %self.table, "Unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_event(new_column: Option<&str>, old_column: Option<&str>) -> ChangeEvent {
        ChangeEvent {
            table: Table::Tasks,
            kind: ChangeKind::Update,
            new: new_column.map(|c| json!({ "column_id": c })),
            old: old_column.map(|c| json!({ "column_id": c })),
        }
    }

    #[test]
    fn test_field_prefers_new_row() {
        let event = task_event(Some("b"), Some("a"));
        assert_eq!(event.field("column_id"), Some("b".to_string()));

        let deleted = task_event(None, Some("a"));
        assert_eq!(deleted.field("column_id"), Some("a".to_string()));
    }

    #[test]
    fn test_matches_eq_filter_on_either_row() {
        let event = task_event(Some("b"), Some("a"));
        assert!(event.matches(Some(&Filter::eq("column_id", "a"))));
        assert!(event.matches(Some(&Filter::eq("column_id", "b"))));
        assert!(!event.matches(Some(&Filter::eq("column_id", "c"))));
        assert!(event.matches(None));
    }

    #[tokio::test]
    async fn test_subscription_receives_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = Subscription::new(Table::Tasks, rx);

        tx.send(task_event(Some("a"), None)).unwrap();
        let event = subscription.next().await.unwrap();
        assert_eq!(event.table, Table::Tasks);

        subscription.unsubscribe();
        assert!(tx.send(task_event(Some("a"), None)).is_err());
    }
}
