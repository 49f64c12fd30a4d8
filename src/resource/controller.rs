use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::confirm::Confirm;
use super::spec::ResourceSpec;
use crate::error::AdminError;
use crate::filter::Filter;
use crate::store::record::{ContentRecord, Language};
use crate::store::{with_timeout, RemoteStore};

/// Everything a manager screen renders from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub records: Vec<ContentRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub editing_id: Option<String>,
    pub is_creating: bool,
    pub form_data: ContentRecord,
    pub saving: bool,
}

impl ControllerState {
    /// True while a create or edit form is open
    pub fn has_open_form(&self) -> bool {
        self.is_creating || self.editing_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Records replaced with this many rows
    Applied(usize),
    /// A newer fetch was issued while this one was in flight; result dropped
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Declined,
    Deleted,
}

/// Clears an in-flight flag however the guarded call exits
pub(crate) struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SaveGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// CRUD controller for one table, kept in sync by full refetch.
///
/// All methods take `&self`; share the controller behind an `Arc`. State is
/// read through [`ResourceController::snapshot`].
pub struct ResourceController {
    spec: &'static ResourceSpec,
    store: Arc<dyn RemoteStore>,
    timeout: Duration,
    language: Option<Language>,
    state: Mutex<ControllerState>,
    generation: AtomicU64,
    saving: AtomicBool,
}

impl ResourceController {
    pub fn new(spec: &'static ResourceSpec, store: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        Self {
            spec,
            store,
            timeout,
            language: None,
            state: Mutex::new(ControllerState {
                form_data: spec.blank(),
                ..Default::default()
            }),
            generation: AtomicU64::new(0),
            saving: AtomicBool::new(false),
        }
    }

    /// Restrict fetches to rows in one language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ControllerState {
        let mut state = self.lock().clone();
        state.saving = self.saving.load(Ordering::SeqCst);
        state
    }

    pub fn records(&self) -> Vec<ContentRecord> {
        self.lock().records.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    fn filter(&self) -> Result<Filter, AdminError> {
        let mut filter = self.spec.base_filter()?;
        if let Some(language) = self.language {
            filter.where_eq("language", language.as_str())?;
        }
        Ok(filter)
    }

    fn record_error(&self, error: &AdminError) {
        self.lock().error = Some(error.to_string());
    }

    // ========================================
    // Fetch
    // ========================================

    /// Replace `records` with the table's current rows. Only the most recently
    /// issued fetch may write its result.
    pub async fn fetch_all(&self) -> Result<FetchOutcome, AdminError> {
        let filter = self.filter()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().loading = true;
        debug!("fetch {} (generation {})", self.spec.table, generation);

        let result = with_timeout(self.timeout, self.store.select(&filter)).await;

        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("fetch {} generation {} superseded", self.spec.table, generation);
            return Ok(FetchOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(records) => {
                let count = records.len();
                state.records = records;
                Ok(FetchOutcome::Applied(count))
            }
            Err(e) => {
                warn!("fetch {} failed: {}", self.spec.table, e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Refetch after a mutation; a failure here is shown in `error` but does
    /// not undo the mutation that preceded it
    async fn refresh(&self) {
        if let Err(e) = self.fetch_all().await {
            warn!("refetch of {} after change failed: {}", self.spec.table, e);
        }
    }

    // ========================================
    // Editing slot
    // ========================================

    pub fn begin_create(&self) {
        let mut state = self.lock();
        state.is_creating = true;
        state.editing_id = None;
        state.form_data = self.spec.blank();
    }

    pub fn begin_edit(&self, record: &ContentRecord) {
        let mut state = self.lock();
        state.editing_id = record.id();
        state.is_creating = false;
        state.form_data = record.clone();
    }

    pub fn cancel(&self) {
        let mut state = self.lock();
        state.editing_id = None;
        state.is_creating = false;
        state.form_data = self.spec.blank();
    }

    pub fn set_field(&self, key: &str, value: impl Into<Value>) {
        self.lock().form_data.set(key, value);
    }

    /// Overlay several form fields at once
    pub fn update_form(&self, changes: &ContentRecord) {
        self.lock().form_data.merge(changes);
    }

    /// Mutate the open form in place
    pub fn edit_form<R>(&self, edit: impl FnOnce(&mut ContentRecord) -> R) -> R {
        edit(&mut self.lock().form_data)
    }

    pub fn dismiss_error(&self) {
        self.lock().error = None;
    }

    /// Records matching a case-insensitive search over the resource's search fields
    pub fn matching(&self, term: &str) -> Vec<ContentRecord> {
        self.lock()
            .records
            .iter()
            .filter(|record| record.matches_search(term, self.spec.search_fields))
            .cloned()
            .collect()
    }

    // ========================================
    // Mutations
    // ========================================

    /// Insert or update the open form. Single-flight: a second call while one
    /// is running fails with `SaveInFlight` without touching the store.
    pub async fn save(&self) -> Result<ContentRecord, AdminError> {
        let _guard = SaveGuard::acquire(&self.saving).ok_or(AdminError::SaveInFlight)?;

        let (editing_id, is_creating, form) = {
            let state = self.lock();
            if !state.has_open_form() {
                return Err(AdminError::NoActiveForm);
            }
            (state.editing_id.clone(), state.is_creating, state.form_data.clone())
        };

        if let Err(e) = self.spec.validate(&form) {
            debug!("{} form rejected: {}", self.spec.name, e);
            self.record_error(&e);
            return Err(e);
        }
        self.lock().error = None;

        let payload = form.payload();
        let result = match &editing_id {
            Some(id) => with_timeout(self.timeout, self.store.update(self.spec.table, id, &payload)).await,
            None => with_timeout(self.timeout, self.store.insert(self.spec.table, &payload)).await,
        };

        match result {
            Ok(saved) => {
                info!(
                    "{} {} {}",
                    if editing_id.is_some() { "updated" } else { "created" },
                    self.spec.label,
                    saved.id().unwrap_or_default()
                );
                // Close the form only if it still holds the slot that was saved
                let reopened = {
                    let state = self.lock();
                    state.editing_id != editing_id || state.is_creating != is_creating
                };
                if reopened {
                    debug!("{} form was switched during save; leaving it open", self.spec.name);
                } else {
                    self.cancel();
                }
                self.refresh().await;
                Ok(saved)
            }
            Err(e) => {
                warn!("saving {} failed: {}", self.spec.label, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Delete after confirmation; refetch only when the delete succeeded
    pub async fn remove(&self, id: &str, confirm: &dyn Confirm) -> Result<RemoveOutcome, AdminError> {
        let message = format!("Are you sure you want to delete this {}?", self.spec.label);
        if !confirm.confirm(&message) {
            debug!("delete of {} {} declined", self.spec.label, id);
            return Ok(RemoveOutcome::Declined);
        }

        match with_timeout(self.timeout, self.store.delete(self.spec.table, id)).await {
            Ok(()) => {
                info!("deleted {} {}", self.spec.label, id);
                let editing_removed = self.lock().editing_id.as_deref() == Some(id);
                if editing_removed {
                    self.cancel();
                }
                self.refresh().await;
                Ok(RemoveOutcome::Deleted)
            }
            Err(e) => {
                warn!("deleting {} {} failed: {}", self.spec.label, id, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Patch specific fields of one row outside the form (status flags, inline edits)
    pub async fn update_fields(&self, id: &str, changes: &ContentRecord) -> Result<ContentRecord, AdminError> {
        match with_timeout(self.timeout, self.store.update(self.spec.table, id, &changes.payload())).await {
            Ok(updated) => {
                info!("updated {} {}", self.spec.label, id);
                self.refresh().await;
                Ok(updated)
            }
            Err(e) => {
                warn!("updating {} {} failed: {}", self.spec.label, id, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Insert several rows in one call, then refetch
    pub async fn insert_many(&self, records: &[ContentRecord]) -> Result<Vec<ContentRecord>, AdminError> {
        let payloads: Vec<ContentRecord> = records.iter().map(ContentRecord::payload).collect();
        match with_timeout(self.timeout, self.store.insert_many(self.spec.table, &payloads)).await {
            Ok(inserted) => {
                info!("inserted {} {} row(s)", inserted.len(), self.spec.label);
                self.refresh().await;
                Ok(inserted)
            }
            Err(e) => {
                warn!("bulk insert into {} failed: {}", self.spec.table, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }
}
