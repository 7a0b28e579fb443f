#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use zykor_api::auth::{generate_jwt, BarGrant, Claims, Role};
use zykor_api::config::AppConfig;
use zykor_api::server::{app, AppState};

pub const ANON_KEY: &str = "anon-key";
pub const SERVICE_KEY: &str = "service-key";
pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "senha-correta";
pub const USER_ID: &str = "2b0c8a3e-5f6d-4c1a-9e7b-1234567890ab";

/// One request received by the stub backend
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// In-memory stand-in for the hosted database, auth, function runtime and chat webhook
#[derive(Default)]
pub struct Stub {
    calls: Mutex<Vec<Call>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    functions: Mutex<HashMap<String, (u16, String)>>,
    rpc: Mutex<HashMap<String, Value>>,
    next_id: AtomicI64,
}

impl Stub {
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().extend(rows);
        self.next_id.fetch_add(1000, Ordering::SeqCst);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    /// Answer `name` with a fixed status and raw body
    pub fn respond(&self, function: &str, status: u16, body: &str) {
        self.functions
            .lock()
            .unwrap()
            .insert(function.to_string(), (status, body.to_string()));
    }

    pub fn rpc_result(&self, function: &str, result: Value) {
        self.rpc.lock().unwrap().insert(function.to_string(), result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    /// Every call that could change downstream state
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != "GET" && c.path != "/auth/v1/token")
            .collect()
    }

    fn record(&self, method: &str, path: String, query: Option<&str>, headers: &HeaderMap, body: Value) {
        self.calls.lock().unwrap().push(Call {
            method: method.to_string(),
            path,
            query: query.unwrap_or_default().to_string(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
    }
}

fn eq_filters(query: Option<&str>) -> (Vec<(String, String)>, Option<usize>) {
    let mut filters = Vec::new();
    let mut limit = None;
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "select" | "order" | "offset" => {}
            "limit" => limit = value.parse().ok(),
            _ => {
                if let Some(expected) = value.strip_prefix("eq.") {
                    filters.push((key.to_string(), expected.to_string()));
                }
            }
        }
    }
    (filters, limit)
}

fn matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, expected)| {
        let actual = match row.get(column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "null".to_string(),
            Some(other) => other.to_string(),
        };
        &actual == expected
    })
}

type Shared = State<Arc<Stub>>;

async fn rest_root(State(stub): Shared, headers: HeaderMap) -> Json<Value> {
    stub.record("GET", "/rest/v1/".into(), None, &headers, Value::Null);
    Json(json!({}))
}

async fn table_get(
    State(stub): Shared,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Value> {
    stub.record("GET", format!("/rest/v1/{}", table), query.as_deref(), &headers, Value::Null);
    let (filters, limit) = eq_filters(query.as_deref());
    let mut rows: Vec<Value> = stub.rows(&table).into_iter().filter(|r| matches(r, &filters)).collect();
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    Json(Value::Array(rows))
}

async fn table_post(
    State(stub): Shared,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.record("POST", format!("/rest/v1/{}", table), None, &headers, body.clone());
    let incoming = match body {
        Value::Array(rows) => rows,
        other => vec![other],
    };

    let mut inserted = Vec::new();
    for mut row in incoming {
        if row.get("id").is_none() {
            row["id"] = json!(stub.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        }
        row["created_at"] = json!(chrono::Utc::now().to_rfc3339());
        inserted.push(row);
    }
    stub.tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .extend(inserted.clone());

    (StatusCode::CREATED, Json(Value::Array(inserted)))
}

async fn table_patch(
    State(stub): Shared,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Json<Value> {
    stub.record("PATCH", format!("/rest/v1/{}", table), query.as_deref(), &headers, patch.clone());
    let (filters, _) = eq_filters(query.as_deref());

    let mut updated = Vec::new();
    let mut tables = stub.tables.lock().unwrap();
    for row in tables.entry(table).or_default().iter_mut() {
        if matches(row, &filters) {
            if let (Value::Object(target), Value::Object(changes)) = (&mut *row, &patch) {
                for (k, v) in changes {
                    target.insert(k.clone(), v.clone());
                }
            }
            updated.push(row.clone());
        }
    }
    Json(Value::Array(updated))
}

async fn table_delete(
    State(stub): Shared,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Value> {
    stub.record("DELETE", format!("/rest/v1/{}", table), query.as_deref(), &headers, Value::Null);
    let (filters, _) = eq_filters(query.as_deref());

    let mut tables = stub.tables.lock().unwrap();
    let rows = tables.entry(table).or_default();
    let (removed, kept): (Vec<Value>, Vec<Value>) = rows.drain(..).partition(|r| matches(r, &filters));
    *rows = kept;
    Json(Value::Array(removed))
}

async fn rpc(
    State(stub): Shared,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(args): Json<Value>,
) -> Json<Value> {
    stub.record("POST", format!("/rest/v1/rpc/{}", function), None, &headers, args);
    let result = stub.rpc.lock().unwrap().get(&function).cloned();
    Json(result.unwrap_or_else(|| json!({ "ok": true })))
}

async fn auth_token(
    State(stub): Shared,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record("POST", "/auth/v1/token".into(), query.as_deref(), &headers, body.clone());
    if body["password"] == PASSWORD {
        Json(json!({
            "access_token": "stub-access-token",
            "token_type": "bearer",
            "user": { "id": USER_ID, "email": body["email"] }
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response()
    }
}

async fn edge_function(
    State(stub): Shared,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record("POST", format!("/functions/v1/{}", name), None, &headers, body);
    let configured = stub.functions.lock().unwrap().get(&name).cloned();
    match configured {
        Some((status, text)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, text).into_response()
        }
        None => Json(json!({ "success": true, "function": name })).into_response(),
    }
}

async fn discord(State(stub): Shared, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    stub.record("POST", "/discord".into(), None, &headers, body);
    StatusCode::NO_CONTENT
}

async fn serve(router: Router) -> Result<String> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

/// The API under test wired to a fresh stub backend
pub struct TestServer {
    pub base_url: String,
    pub stub_url: String,
    pub stub: Arc<Stub>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let stub = Arc::new(Stub::default());
        let stub_router = Router::new()
            .route("/rest/v1/", get(rest_root))
            .route("/rest/v1/rpc/:function", post(rpc))
            .route(
                "/rest/v1/:table",
                get(table_get).post(table_post).patch(table_patch).delete(table_delete),
            )
            .route("/auth/v1/token", post(auth_token))
            .route("/functions/v1/:name", post(edge_function))
            .route("/discord", post(discord))
            .with_state(stub.clone());
        let stub_url = serve(stub_router).await?;

        let mut config = AppConfig::development();
        config.supabase.url = stub_url.clone();
        config.supabase.anon_key = ANON_KEY.to_string();
        config.supabase.service_role_key = SERVICE_KEY.to_string();
        config.supabase.functions_url = None;
        config.security.jwt_secret = JWT_SECRET.to_string();
        config.integrations.discord_webhook_url = Some(format!("{}/discord", stub_url));
        customize(&mut config);

        let state = AppState::new(config).context("failed to build app state")?;
        let base_url = serve(app(state)).await?;

        Ok(Self {
            base_url,
            stub_url,
            stub,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Same role and modules in every listed bar
    pub fn token(&self, role: Role, bares: &[i64], modulos: &[&str]) -> String {
        let modulos: Vec<String> = modulos.iter().map(|m| m.to_string()).collect();
        self.grants_token(
            bares
                .iter()
                .map(|&bar_id| BarGrant::new(bar_id, role, modulos.clone()))
                .collect(),
        )
    }

    pub fn grants_token(&self, bares: Vec<BarGrant>) -> String {
        sign(Claims::new(Uuid::new_v4(), "usuario@bar.com".to_string(), None, false, bares, 1))
    }

    /// Platform operator, not tied to any bar
    pub fn admin_token(&self) -> String {
        sign(Claims::new(Uuid::new_v4(), "ops@zykor.com.br".to_string(), None, true, vec![], 1))
    }
}

fn sign(claims: Claims) -> String {
    generate_jwt(&claims, JWT_SECRET).expect("failed to sign test token")
}

/// Unused local port, for pointing a downstream at nothing
pub fn dead_url() -> String {
    let port = portpicker::pick_unused_port().expect("failed to pick free port");
    format!("http://127.0.0.1:{}", port)
}
