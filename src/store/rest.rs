use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::record::ContentRecord;
use super::RemoteStore;
use crate::backend::{check_response, Backend};
use crate::error::AdminError;
use crate::filter::Filter;

/// Table client for the backend's REST interface (`/rest/v1/<table>`)
#[derive(Clone)]
pub struct RestStore {
    backend: Backend,
}

impl RestStore {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    fn id_filter(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<ContentRecord>, AdminError> {
        let body: Value = response.json().await?;
        let items = match body {
            Value::Array(items) => items,
            Value::Object(_) => vec![body],
            Value::Null => vec![],
            other => return Err(AdminError::remote(format!("unexpected response body: {}", other))),
        };
        items
            .into_iter()
            .map(|item| ContentRecord::from_row(item).map_err(AdminError::from))
            .collect()
    }

    fn first(table: &str, rows: Vec<ContentRecord>) -> Result<ContentRecord, AdminError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| AdminError::remote(format!("no row returned from '{}'", table)))
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, filter: &Filter) -> Result<Vec<ContentRecord>, AdminError> {
        let url = self.backend.endpoint().rest_url(filter.table());
        debug!("select {} {:?}", filter.table(), filter.to_query_pairs());

        let request = self.backend.http().get(url).query(&filter.to_query_pairs());
        let response = check_response(self.backend.authorize(request).send().await?).await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, record: &ContentRecord) -> Result<ContentRecord, AdminError> {
        let rows = self.insert_many(table, std::slice::from_ref(record)).await?;
        Self::first(table, rows)
    }

    async fn update(&self, table: &str, id: &str, changes: &ContentRecord) -> Result<ContentRecord, AdminError> {
        let url = self.backend.endpoint().rest_url(table);
        debug!("update {} id={}", table, id);

        let request = self
            .backend
            .http()
            .patch(url)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation")
            .json(&changes.payload());
        let response = check_response(self.backend.authorize(request).send().await?).await?;
        Self::first(table, Self::rows(response).await?)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AdminError> {
        let url = self.backend.endpoint().rest_url(table);
        debug!("delete {} id={}", table, id);

        let request = self.backend.http().delete(url).query(&Self::id_filter(id));
        check_response(self.backend.authorize(request).send().await?).await?;
        Ok(())
    }

    async fn insert_many(&self, table: &str, records: &[ContentRecord]) -> Result<Vec<ContentRecord>, AdminError> {
        let url = self.backend.endpoint().rest_url(table);
        debug!("insert {} rows into {}", records.len(), table);

        let body: Vec<ContentRecord> = records.iter().map(ContentRecord::payload).collect();
        let request = self
            .backend
            .http()
            .post(url)
            .header("Prefer", "return=representation")
            .json(&body);
        let response = check_response(self.backend.authorize(request).send().await?).await?;
        Self::rows(response).await
    }
}
