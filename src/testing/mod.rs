//! In-memory collaborators for unit tests: a table store, an auth service and
//! a storage bucket. Each records its calls, can be told to fail an operation,
//! and can hold an operation open until the test releases it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::auth::{AuthService, Session, SessionCallback, SessionEvent, SessionListeners, Subscription};
use crate::error::AdminError;
use crate::filter::{Filter, FilterOp, SortDirection};
use crate::store::record::ContentRecord;
use crate::store::{RemoteStore, StorageBucket, StorageObject};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A held operation: the stub signals `entered` and then waits for `release`
#[derive(Clone, Default)]
pub struct Hold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    /// Resolves once the held call has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Call log, failure injection and holds shared by the stubs
#[derive(Default)]
struct Script {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, String>>,
    holds: Mutex<HashMap<String, Hold>>,
}

impl Script {
    async fn enter(&self, op: &str) -> Result<(), AdminError> {
        lock(&self.calls).push(op.to_string());

        let hold = lock(&self.holds).remove(op);
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        match lock(&self.failures).get(op) {
            Some(message) => Err(AdminError::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn calls(&self, op: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.as_str() == op).count()
    }

    fn total(&self) -> usize {
        lock(&self.calls).len()
    }

    fn fail(&self, op: &str, message: &str) {
        lock(&self.failures).insert(op.to_string(), message.to_string());
    }

    fn recover(&self, op: &str) {
        lock(&self.failures).remove(op);
    }

    fn hold(&self, op: &str) -> Hold {
        let hold = Hold::default();
        lock(&self.holds).insert(op.to_string(), hold.clone());
        hold
    }
}

// ========================================
// Table store
// ========================================

/// Table store over in-memory rows. Operations are logged as
/// `select`, `insert`, `update` and `delete`.
#[derive(Default)]
pub struct StubStore {
    tables: Mutex<HashMap<String, Vec<ContentRecord>>>,
    script: Script,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.seed(table, rows);
        self
    }

    /// Replace a table's rows
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let records = rows
            .into_iter()
            .filter_map(|row| ContentRecord::from_row(row).ok())
            .collect();
        lock(&self.tables).insert(table.to_string(), records);
    }

    pub fn rows(&self, table: &str) -> Vec<ContentRecord> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.script.calls(op)
    }

    pub fn total_calls(&self) -> usize {
        self.script.total()
    }

    /// Fail every `op` call until [`StubStore::recover`]
    pub fn fail(&self, op: &str, message: &str) {
        self.script.fail(op, message);
    }

    pub fn recover(&self, op: &str) {
        self.script.recover(op);
    }

    /// Hold the next `op` call open
    pub fn hold_next(&self, op: &str) -> Hold {
        self.script.hold(op)
    }

    fn matches(record: &ContentRecord, filter: &Filter) -> bool {
        filter.conditions().iter().all(|cond| {
            let value = record.get(&cond.column).unwrap_or(&Value::Null);
            match cond.operator {
                FilterOp::Eq => loose_eq(value, &cond.data),
                FilterOp::Neq => !loose_eq(value, &cond.data),
                FilterOp::In => cond
                    .data
                    .as_array()
                    .map(|items| items.iter().any(|item| loose_eq(value, item)))
                    .unwrap_or(false),
                _ => true,
            }
        })
    }
}

fn loose_eq(value: &Value, expected: &Value) -> bool {
    match (value, expected) {
        (Value::Number(_), Value::String(s)) | (Value::Bool(_), Value::String(s)) => value.to_string() == *s,
        _ => value == expected,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // Nulls sort last ascending
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RemoteStore for StubStore {
    async fn select(&self, filter: &Filter) -> Result<Vec<ContentRecord>, AdminError> {
        self.script.enter("select").await?;

        let mut rows: Vec<ContentRecord> = self
            .rows(filter.table())
            .into_iter()
            .filter(|record| Self::matches(record, filter))
            .collect();

        rows.sort_by(|a, b| {
            for order in filter.ordering() {
                let cmp = compare_values(a.get(&order.column), b.get(&order.column));
                let cmp = match order.sort {
                    SortDirection::Asc => cmp,
                    SortDirection::Desc => cmp.reverse(),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = filter.limit_value() {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: &ContentRecord) -> Result<ContentRecord, AdminError> {
        self.script.enter("insert").await?;

        let mut row = record.payload();
        row.set_system_field("id", Uuid::new_v4().to_string());
        row.set_system_field("created_at", Utc::now().to_rfc3339());
        lock(&self.tables).entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, changes: &ContentRecord) -> Result<ContentRecord, AdminError> {
        self.script.enter("update").await?;

        let mut tables = lock(&self.tables);
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id().as_deref() == Some(id)))
            .ok_or_else(|| AdminError::remote(format!("404 no row {} in {}", id, table)))?;
        row.merge(&changes.payload());
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AdminError> {
        self.script.enter("delete").await?;

        if let Some(rows) = lock(&self.tables).get_mut(table) {
            rows.retain(|r| r.id().as_deref() != Some(id));
        }
        Ok(())
    }
}

// ========================================
// Auth service
// ========================================

/// Auth service holding one session. The session query is logged as `session`.
#[derive(Default)]
pub struct StubAuth {
    session: Mutex<Option<Session>>,
    listeners: SessionListeners,
    script: Script,
}

impl StubAuth {
    pub fn signed_in(token: &str) -> Self {
        let auth = Self::default();
        *lock(&auth.session) = Some(Session::new(token, None));
        auth
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn fail_session_query(&self, message: &str) {
        self.script.fail("session", message);
    }

    pub fn hold_session_query(&self) -> Hold {
        self.script.hold("session")
    }

    /// Change the session and notify listeners, as the real service would
    pub fn emit(&self, event: SessionEvent, session: Option<Session>) {
        *lock(&self.session) = session.clone();
        self.listeners.notify(event, session.as_ref());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.script.calls(op)
    }
}

#[async_trait]
impl AuthService for StubAuth {
    async fn current_session(&self) -> Result<Option<Session>, AdminError> {
        self.script.enter("session").await?;
        Ok(lock(&self.session).clone())
    }

    fn on_session_change(&self, callback: SessionCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdminError> {
        self.script.enter("sign_in").await?;
        if email.is_empty() || password.is_empty() {
            return Err(AdminError::validation("Email and password are required", vec![]));
        }
        let session = Session::new(format!("token-for-{}", email), Some("refresh".into()));
        self.emit(SessionEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AdminError> {
        self.script.enter("sign_out").await?;
        self.emit(SessionEvent::SignedOut, None);
        Ok(())
    }
}

// ========================================
// Storage bucket
// ========================================

/// Bucket over an in-memory path map. Operations are logged as `list`,
/// `upload` and `remove`.
#[derive(Default)]
pub struct StubStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    script: Script,
}

impl StubStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, path: &str) -> Self {
        lock(&self.objects).insert(path.to_string(), Vec::new());
        self
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.script.calls(op)
    }

    pub fn fail(&self, op: &str, message: &str) {
        self.script.fail(op, message);
    }

    pub fn hold_next(&self, op: &str) -> Hold {
        self.script.hold(op)
    }
}

#[async_trait]
impl StorageBucket for StubStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, AdminError> {
        self.script.enter("list").await?;

        let dir = format!("{}/", prefix.trim_end_matches('/'));
        // BTreeMap iteration is already name-ascending
        Ok(lock(&self.objects)
            .keys()
            .filter_map(|path| path.strip_prefix(&dir))
            .filter(|name| !name.contains('/'))
            .map(|name| StorageObject {
                name: name.to_string(),
                id: Some(Uuid::new_v4().to_string()),
                created_at: None,
                metadata: None,
            })
            .collect())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), AdminError> {
        self.script.enter("upload").await?;
        lock(&self.objects).insert(path.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), AdminError> {
        self.script.enter("remove").await?;
        let mut objects = lock(&self.objects);
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/object/public/bucket/{}", path)
    }
}
