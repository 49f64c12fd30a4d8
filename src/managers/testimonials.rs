use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::AdminError;
use crate::resource::{Confirm, FetchOutcome, RemoveOutcome, SaveGuard};
use crate::store::{with_timeout, StorageBucket, StorageObject};

/// Marker object storage creates for empty folders
pub const PLACEHOLDER: &str = ".emptyFolderPlaceholder";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestimonialsState {
    pub files: Vec<StorageObject>,
    pub loading: bool,
    pub uploading: bool,
    pub error: Option<String>,
}

/// Testimonial images kept as files under one folder of a storage bucket.
/// Follows the same rules as the table controllers: only the newest listing is
/// applied, one upload at a time, and a delete refetches only on success.
pub struct TestimonialsManager {
    bucket: Arc<dyn StorageBucket>,
    prefix: String,
    timeout: Duration,
    state: Mutex<TestimonialsState>,
    generation: AtomicU64,
    uploading: AtomicBool,
}

impl TestimonialsManager {
    pub fn new(bucket: Arc<dyn StorageBucket>, prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bucket,
            prefix: prefix.into().trim_matches('/').to_string(),
            timeout,
            state: Mutex::new(TestimonialsState::default()),
            generation: AtomicU64::new(0),
            uploading: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TestimonialsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> TestimonialsState {
        let mut state = self.lock().clone();
        state.uploading = self.uploading.load(Ordering::SeqCst);
        state
    }

    pub fn files(&self) -> Vec<StorageObject> {
        self.lock().files.clone()
    }

    fn object_path(&self, name: &str) -> String {
        format!("{}/{}", self.prefix, name)
    }

    pub fn public_url(&self, name: &str) -> String {
        self.bucket.public_url(&self.object_path(name))
    }

    pub fn matching(&self, term: &str) -> Vec<StorageObject> {
        let needle = term.trim().to_lowercase();
        self.lock()
            .files
            .iter()
            .filter(|file| file.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn dismiss_error(&self) {
        self.lock().error = None;
    }

    fn record_error(&self, error: &AdminError) {
        self.lock().error = Some(error.to_string());
    }

    pub async fn fetch_all(&self) -> Result<FetchOutcome, AdminError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().loading = true;
        debug!("list {} (generation {})", self.prefix, generation);

        let result = with_timeout(self.timeout, self.bucket.list(&self.prefix)).await;

        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(FetchOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(objects) => {
                let mut files: Vec<StorageObject> = objects
                    .into_iter()
                    .filter(|object| !object.name.is_empty() && object.name != PLACEHOLDER)
                    .collect();
                files.sort_by(|a, b| a.name.cmp(&b.name));
                let count = files.len();
                state.files = files;
                Ok(FetchOutcome::Applied(count))
            }
            Err(e) => {
                warn!("listing testimonials failed: {}", e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn refresh(&self) {
        if let Err(e) = self.fetch_all().await {
            warn!("refetch of testimonials failed: {}", e);
        }
    }

    /// Store a new image as `<unix-millis>-<file name>`; returns the stored name
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AdminError> {
        let _guard = SaveGuard::acquire(&self.uploading).ok_or(AdminError::SaveInFlight)?;

        let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
        if base.is_empty() {
            let err = AdminError::validation("A file name is required", vec!["file".into()]);
            self.record_error(&err);
            return Err(err);
        }
        self.lock().error = None;

        let stored = format!("{}-{}", Utc::now().timestamp_millis(), base);
        let path = self.object_path(&stored);
        match with_timeout(self.timeout, self.bucket.upload(&path, bytes, content_type)).await {
            Ok(()) => {
                info!("uploaded testimonial {}", path);
                self.refresh().await;
                Ok(stored)
            }
            Err(e) => {
                warn!("uploading {} failed: {}", path, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    pub async fn remove(&self, name: &str, confirm: &dyn Confirm) -> Result<RemoveOutcome, AdminError> {
        if !confirm.confirm("Are you sure you want to delete this testimonial?") {
            return Ok(RemoveOutcome::Declined);
        }

        let path = self.object_path(name);
        match with_timeout(self.timeout, self.bucket.remove(&[path.clone()])).await {
            Ok(()) => {
                info!("deleted testimonial {}", path);
                self.refresh().await;
                Ok(RemoveOutcome::Deleted)
            }
            Err(e) => {
                warn!("deleting {} failed: {}", path, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }
}
