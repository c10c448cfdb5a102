//! Typed helpers over the JSON store contract

use super::{Query, RemoteStore, StoreResult};
use crate::models::{FieldPatch, Record};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Decodes a store row
pub fn decode<R: Record>(row: JsonValue) -> StoreResult<R> {
    Ok(serde_json::from_value(row)?)
}

/// Decodes a list of store rows
pub fn decode_all<R: Record>(rows: Vec<JsonValue>) -> StoreResult<Vec<R>> {
    rows.into_iter().map(decode).collect()
}

/// Selects rows of `R`'s table
pub async fn select<R: Record>(store: &dyn RemoteStore, query: Query) -> StoreResult<Vec<R>> {
    debug_assert_eq!(query.table, R::TABLE);
    decode_all(store.select(query).await?)
}

/// Inserts one row and returns it as stored
pub async fn insert_one<R: Record>(store: &dyn RemoteStore, row: JsonValue) -> StoreResult<R> {
    let mut rows = store.insert(R::TABLE, vec![row]).await?;
    match rows.pop() {
        Some(row) => decode(row),
        None => Err(super::StoreError::rejected(format!(
            "insert into {} returned no row",
            R::TABLE
        ))),
    }
}

/// Inserts rows and returns them as stored
pub async fn insert_many<R: Record>(store: &dyn RemoteStore, rows: Vec<JsonValue>) -> StoreResult<Vec<R>> {
    decode_all(store.insert(R::TABLE, rows).await?)
}

/// Applies a field patch to one row and returns the stored row
pub async fn update<R, P>(store: &dyn RemoteStore, id: Uuid, patch: &P) -> StoreResult<R>
where
    R: Record,
    P: FieldPatch<R> + ?Sized,
{
    let changes = JsonValue::Object(patch.changes());
    decode(store.update(R::TABLE, id, changes).await?)
}

/// Deletes one row of `R`'s table
pub async fn delete<R: Record>(store: &dyn RemoteStore, id: Uuid) -> StoreResult<()> {
    store.delete(R::TABLE, id).await
}
