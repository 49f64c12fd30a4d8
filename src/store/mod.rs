pub mod record;
pub mod rest;
pub mod storage;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::AdminError;
use crate::filter::Filter;
use record::ContentRecord;

pub use rest::RestStore;
pub use storage::{RestStorage, StorageBucket, StorageObject};

/// Row-level access to the hosted tables
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, filter: &Filter) -> Result<Vec<ContentRecord>, AdminError>;

    async fn insert(&self, table: &str, record: &ContentRecord) -> Result<ContentRecord, AdminError>;

    async fn update(&self, table: &str, id: &str, changes: &ContentRecord) -> Result<ContentRecord, AdminError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), AdminError>;

    /// Insert several rows; backends with bulk insert override this
    async fn insert_many(&self, table: &str, records: &[ContentRecord]) -> Result<Vec<ContentRecord>, AdminError> {
        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            inserted.push(self.insert(table, record).await?);
        }
        Ok(inserted)
    }
}

/// Bound a remote call by `timeout`; an elapsed call becomes `AdminError::Timeout`
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, AdminError>
where
    F: Future<Output = Result<T, AdminError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("remote call timed out after {:?}", timeout);
            Err(AdminError::Timeout(timeout))
        }
    }
}
