use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::backend::{check_response, Backend};
use crate::error::AdminError;

/// A file entry in an object-storage bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Object storage scoped to a single bucket
#[async_trait]
pub trait StorageBucket: Send + Sync {
    /// Objects directly under `prefix`, sorted by name ascending
    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, AdminError>;

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AdminError>;

    async fn remove(&self, paths: &[String]) -> Result<(), AdminError>;

    fn public_url(&self, path: &str) -> String;
}

/// Storage client for the backend's object API (`/storage/v1/object/...`)
#[derive(Clone)]
pub struct RestStorage {
    backend: Backend,
    bucket: String,
}

impl RestStorage {
    const LIST_LIMIT: u32 = 100;

    pub fn new(backend: Backend, bucket: impl Into<String>) -> Self {
        Self { backend, bucket: bucket.into() }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageBucket for RestStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, AdminError> {
        let url = self.backend.endpoint().storage_url(&format!("object/list/{}", self.bucket));
        debug!("list {}/{}", self.bucket, prefix);

        let request = self.backend.http().post(url).json(&json!({
            "prefix": prefix,
            "limit": Self::LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" }
        }));
        let response = check_response(self.backend.authorize(request).send().await?).await?;
        Ok(response.json::<Vec<StorageObject>>().await?)
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AdminError> {
        let url = self.backend.endpoint().storage_url(&format!("object/{}/{}", self.bucket, path));
        debug!("upload {}/{} ({} bytes)", self.bucket, path, bytes.len());

        let request = self
            .backend
            .http()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        check_response(self.backend.authorize(request).send().await?).await?;
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), AdminError> {
        let url = self.backend.endpoint().storage_url(&format!("object/{}", self.bucket));
        debug!("remove {:?} from {}", paths, self.bucket);

        let request = self.backend.http().delete(url).json(&json!({ "prefixes": paths }));
        check_response(self.backend.authorize(request).send().await?).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.backend
            .endpoint()
            .storage_url(&format!("object/public/{}/{}", self.bucket, path))
    }
}
