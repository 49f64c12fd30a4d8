#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use portfolio_site::backend::{Backend, BackendEndpoint};

pub const ANON_KEY: &str = "anon-test-key";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const BUCKET: &str = "Recognition";

/// Tables anyone holding the anon key may insert into
const ANON_INSERT_TABLES: &[&str] = &["contact_submissions"];

#[derive(Default)]
pub struct FakeState {
    pub tables: HashMap<String, Vec<Value>>,
    pub objects: Vec<String>,
    pub access_tokens: Vec<String>,
    pub refresh_tokens: Vec<String>,
    pub requests: Vec<(String, String)>,
    next_id: u64,
    next_token: u64,
}

/// In-process stand-in for the hosted table, auth and storage API
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.lock();
        for mut row in rows {
            if row.get("id").is_none() {
                state.next_id += 1;
                row["id"] = json!(format!("row-{}", state.next_id));
            }
            state.tables.entry(table.to_string()).or_default().push(row);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn add_object(&self, path: &str) {
        self.lock().objects.push(path.to_string());
    }

    pub fn objects(&self) -> Vec<String> {
        self.lock().objects.clone()
    }

    /// Count of recorded requests with this method whose path ends with `suffix`
    pub fn requests(&self, method: &str, suffix: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p.ends_with(suffix))
            .count()
    }

    fn record(&self, method: &Method, path: &str) {
        self.lock().requests.push((method.to_string(), path.to_string()));
    }

    fn issue_tokens(&self) -> (String, String) {
        let mut state = self.lock();
        state.next_token += 1;
        let access = format!("access-{}", state.next_token);
        let refresh = format!("refresh-{}", state.next_token);
        state.access_tokens.push(access.clone());
        state.refresh_tokens.push(refresh.clone());
        (access, refresh)
    }
}

pub struct TestBackend {
    pub port: u16,
    pub base_url: String,
    pub fake: FakeBackend,
    handle: JoinHandle<()>,
}

impl TestBackend {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let fake = FakeBackend::default();

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind fake backend")?;
        let app = router(fake.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let backend = Self {
            port,
            base_url,
            fake,
            handle,
        };
        backend.wait_ready(Duration::from_secs(5)).await?;
        Ok(backend)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/ready", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("fake backend did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn endpoint(&self) -> BackendEndpoint {
        BackendEndpoint::new(&self.base_url, ANON_KEY)
    }

    pub fn client(&self) -> Result<Backend> {
        Ok(Backend::new(self.endpoint(), Duration::from_secs(5))?)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `app` on a fresh port and return its base URL
pub async fn serve(app: Router) -> Result<(String, JoinHandle<()>)> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://127.0.0.1:{}", port), handle))
}

fn router(fake: FakeBackend) -> Router {
    Router::new()
        .route("/ready", get(|| async { "ok" }))
        .route(
            "/rest/v1/:table",
            get(select_rows).post(insert_rows).patch(update_rows).delete(delete_rows),
        )
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/storage/v1/*rest", any(storage))
        .with_state(fake)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn check_apikey(headers: &HeaderMap) -> Result<(), Response> {
    match headers.get("apikey").and_then(|v| v.to_str().ok()) {
        Some(ANON_KEY) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Invalid API key")),
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn check_signed_in(fake: &FakeBackend, headers: &HeaderMap) -> Result<(), Response> {
    check_apikey(headers)?;
    match bearer(headers) {
        Some(token) if fake.lock().access_tokens.contains(&token) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "permission denied")),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn matches_condition(row: &Value, column: &str, condition: &str) -> bool {
    let field = row.get(column).map(render).unwrap_or_else(|| "null".into());
    if let Some(expected) = condition.strip_prefix("eq.") {
        field == expected
    } else if let Some(expected) = condition.strip_prefix("neq.") {
        field != expected
    } else if let Some(list) = condition.strip_prefix("in.(").and_then(|l| l.strip_suffix(')')) {
        list.split(',').any(|item| item.trim_matches('"') == field)
    } else if condition == "is.null" {
        field == "null"
    } else {
        true
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(std::cmp::Ordering::Equal),
        (x, y) => x.map(render).cmp(&y.map(render)),
    }
}

async fn select_rows(
    State(fake): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    fake.record(&Method::GET, &format!("/rest/v1/{}", table));
    if let Err(resp) = check_apikey(&headers) {
        return resp;
    }

    let mut rows = fake.rows(&table);
    let mut order = None;
    let mut limit = None;
    for (key, value) in &params {
        match key.as_str() {
            "select" | "offset" => {}
            "order" => order = Some(value.clone()),
            "limit" => limit = value.parse::<usize>().ok(),
            column => rows.retain(|row| matches_condition(row, column, value)),
        }
    }

    if let Some(order) = order {
        let keys: Vec<(String, bool)> = order
            .split(',')
            .map(|part| match part.rsplit_once('.') {
                Some((column, dir)) => (column.to_string(), dir == "desc"),
                None => (part.to_string(), false),
            })
            .collect();
        rows.sort_by(|a, b| {
            for (column, desc) in &keys {
                let ordering = compare(a.get(column), b.get(column));
                let ordering = if *desc { ordering.reverse() } else { ordering };
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    Json(Value::Array(rows)).into_response()
}

async fn insert_rows(
    State(fake): State<FakeBackend>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record(&Method::POST, &format!("/rest/v1/{}", table));
    let allowed = if ANON_INSERT_TABLES.contains(&table.as_str()) {
        check_apikey(&headers)
    } else {
        check_signed_in(&fake, &headers)
    };
    if let Err(resp) = allowed {
        return resp;
    }

    let items = match body {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut state = fake.lock();
    let mut inserted = Vec::new();
    for item in items {
        let Value::Object(mut fields) = item else {
            return error(StatusCode::BAD_REQUEST, "expected a JSON object");
        };
        if fields.contains_key("id") {
            return error(StatusCode::BAD_REQUEST, "id is generated by the backend");
        }
        state.next_id += 1;
        fields.insert("id".into(), json!(format!("row-{}", state.next_id)));
        fields.insert("created_at".into(), json!(chrono::Utc::now().to_rfc3339()));
        let row = Value::Object(fields);
        state.tables.entry(table.clone()).or_default().push(row.clone());
        inserted.push(row);
    }

    (StatusCode::CREATED, Json(Value::Array(inserted))).into_response()
}

fn id_param(params: &HashMap<String, String>) -> Option<String> {
    params.get("id").and_then(|v| v.strip_prefix("eq.")).map(str::to_string)
}

async fn update_rows(
    State(fake): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    fake.record(&Method::PATCH, &format!("/rest/v1/{}", table));
    if let Err(resp) = check_signed_in(&fake, &headers) {
        return resp;
    }
    let Some(id) = id_param(&params) else {
        return error(StatusCode::BAD_REQUEST, "missing id filter");
    };

    let mut state = fake.lock();
    let rows = state.tables.entry(table).or_default();
    let mut updated = Vec::new();
    for row in rows.iter_mut().filter(|row| row.get("id").map(render).as_deref() == Some(id.as_str())) {
        if let Value::Object(fields) = row {
            for (key, value) in &body {
                fields.insert(key.clone(), value.clone());
            }
        }
        updated.push(row.clone());
    }

    Json(Value::Array(updated)).into_response()
}

async fn delete_rows(
    State(fake): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    fake.record(&Method::DELETE, &format!("/rest/v1/{}", table));
    if let Err(resp) = check_signed_in(&fake, &headers) {
        return resp;
    }
    let Some(id) = id_param(&params) else {
        return error(StatusCode::BAD_REQUEST, "missing id filter");
    };

    let mut state = fake.lock();
    if let Some(rows) = state.tables.get_mut(&table) {
        rows.retain(|row| row.get("id").map(render).as_deref() != Some(id.as_str()));
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn token(
    State(fake): State<FakeBackend>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record(&Method::POST, "/auth/v1/token");
    if let Err(resp) = check_apikey(&headers) {
        return resp;
    }

    let authorized = match params.get("grant_type").map(String::as_str) {
        Some("password") => body["email"] == ADMIN_EMAIL && body["password"] == ADMIN_PASSWORD,
        Some("refresh_token") => {
            let presented = body["refresh_token"].as_str().unwrap_or_default().to_string();
            let mut state = fake.lock();
            let known = state.refresh_tokens.contains(&presented);
            state.refresh_tokens.retain(|t| t != &presented);
            known
        }
        _ => false,
    };
    if !authorized {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
            .into_response();
    }

    let (access, refresh) = fake.issue_tokens();
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": "admin-user", "email": ADMIN_EMAIL }
    }))
    .into_response()
}

async fn logout(State(fake): State<FakeBackend>, headers: HeaderMap) -> Response {
    fake.record(&Method::POST, "/auth/v1/logout");
    if let Some(token) = bearer(&headers) {
        fake.lock().access_tokens.retain(|t| t != &token);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn storage(
    State(fake): State<FakeBackend>,
    method: Method,
    Path(rest): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    fake.record(&method, &format!("/storage/v1/{}", rest));
    if let Err(resp) = check_signed_in(&fake, &headers) {
        return resp;
    }

    let segments: Vec<&str> = rest.trim_start_matches('/').splitn(3, '/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["object", "list", _bucket]) => {
            let request: Value = serde_json::from_slice(&body).unwrap_or_default();
            let prefix = format!("{}/", request["prefix"].as_str().unwrap_or_default().trim_matches('/'));
            let mut names: Vec<String> = fake
                .objects()
                .iter()
                .filter_map(|path| path.strip_prefix(&prefix).map(str::to_string))
                .collect();
            names.push(".emptyFolderPlaceholder".to_string());
            names.sort();
            let listing: Vec<Value> = names.into_iter().map(|name| json!({ "name": name })).collect();
            Json(Value::Array(listing)).into_response()
        }
        ("POST", ["object", _bucket, path]) => {
            fake.add_object(path);
            Json(json!({ "Key": format!("{}/{}", BUCKET, path) })).into_response()
        }
        ("DELETE", ["object", _bucket]) => {
            let request: Value = serde_json::from_slice(&body).unwrap_or_default();
            let doomed: Vec<String> = request["prefixes"]
                .as_array()
                .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            fake.lock().objects.retain(|path| !doomed.contains(path));
            Json(json!([])).into_response()
        }
        _ => error(StatusCode::NOT_FOUND, "unknown storage route"),
    }
}
