//! PostgREST adapter
//!
//! Talks to the hosted data service's REST interface at `{url}/rest/v1/{table}`.
//! Filters are encoded as `column=eq.value` query parameters; an owner filter
//! becomes an inner-joined embed (`select=*,columns!inner(board_id)` plus
//! `columns.board_id=eq.…`), and the embedded key is stripped from returned rows.
//!
//! The REST interface has no change feed, so [`RemoteStore::subscribe`] keeps
//! the default "unsupported" behavior.

use super::{Filter, Query, RemoteStore, StoreError, StoreResult, Table};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for [`RestStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Service base URL (e.g. `https://project.example.co`)
    pub url: String,

    /// Public API key sent as `apikey`
    pub api_key: String,

    /// Session token; the API key is used as bearer when absent
    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RestConfig {
    /// Token sent as `Authorization: Bearer`
    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// [`RemoteStore`] over PostgREST
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    config: RestConfig,
}

impl RestStore {
    /// Creates a store client
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Network`] if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(RestStore { client, config })
    }

    fn endpoint(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.config.bearer_token())
    }

    async fn rows(response: Response) -> StoreResult<Vec<JsonValue>> {
        let response = check(response).await?;
        Ok(response.json().await?)
    }
}

/// Maps a non-success response to a store error
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
    let (code, message) = match body {
        Some(ErrorBody { message: Some(message), code }) => (code, message),
        _ if text.is_empty() => (None, format!("request failed with status {}", status)),
        _ => (None, text),
    };
    tracing::warn!(status = %status, code = ?code, message = %message, "Store request rejected");
    Err(StoreError::Rejected { code, message })
}

/// Query-string parameters for a select
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut embeds = Vec::new();

    for filter in &query.filters {
        match filter {
            Filter::Eq { column, value } => {
                params.push((column.clone(), format!("eq.{}", value)));
            }
            Filter::ParentEq {
                parent,
                column,
                value,
            } => {
                embeds.push(format!("{}!inner({})", parent, column));
                params.push((format!("{}.{}", parent, column), format!("eq.{}", value)));
            }
        }
    }

    let select = if embeds.is_empty() {
        "*".to_string()
    } else {
        format!("*,{}", embeds.join(","))
    };
    params.insert(0, ("select".to_string(), select));

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Removes embedded owner objects added by owner filters
fn strip_embeds(query: &Query, rows: &mut [JsonValue]) {
    for filter in &query.filters {
        if let Filter::ParentEq { parent, .. } = filter {
            for row in rows.iter_mut() {
                if let Some(obj) = row.as_object_mut() {
                    obj.remove(parent.as_str());
                }
            }
        }
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn select(&self, query: Query) -> StoreResult<Vec<JsonValue>> {
        let request = self
            .client
            .get(self.endpoint(query.table))
            .query(&query_params(&query));
        let mut rows = Self::rows(self.authorize(request).send().await?).await?;
        strip_embeds(&query, &mut rows);
        tracing::debug!(table = %query.table, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>> {
        let request = self
            .client
            .post(self.endpoint(table))
            .header("Prefer", "return=representation")
            .json(&rows);
        Self::rows(self.authorize(request).send().await?).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: JsonValue) -> StoreResult<JsonValue> {
        let request = self
            .client
            .patch(self.endpoint(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(&patch);
        let response = self.authorize(request).send().await?;

        // Single-object responses answer 406 when no row matched
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<()> {
        let request = self
            .client
            .delete(self.endpoint(table))
            .query(&[("id", format!("eq.{}", id))]);
        check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<JsonValue>) -> StoreResult<Vec<JsonValue>> {
        let request = self
            .client
            .post(self.endpoint(table))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        Self::rows(self.authorize(request).send().await?).await
    }
}
