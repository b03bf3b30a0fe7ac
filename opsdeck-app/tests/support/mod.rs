//! Test support: a stateful mock backend and a recording audit notifier
//!
//! The mock backend is a real axum app on an ephemeral port, so the views
//! are exercised through the real client and transport. Request counters
//! let tests assert which endpoints were (not) hit.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use opsdeck_app::{AuditEvent, AuditNotifier};
use opsdeck_client::{ApiClient, ApiClientConfig, SessionContext};

pub const TOKEN: &str = "tok_session";

#[derive(Debug, Default, Clone)]
pub struct Counters {
    pub config_list: usize,
    pub users_list: usize,
    pub role_updates: usize,
    pub config_updates: usize,
}

pub struct Backend {
    pub me: Value,
    pub users: Vec<Value>,
    pub configs: Vec<Value>,
    /// When set, PUT /users/{id}/role responds with this (status, detail)
    pub fail_role_update: Option<(u16, &'static str)>,
    /// When set, PUT /users/me responds with this (status, detail)
    pub fail_profile_update: Option<(u16, &'static str)>,
    pub counters: Counters,
    pub last_config_body: Option<Value>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub fn user_json(id: i64, email: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "full_name": null,
        "phone": null,
        "role": role,
        "is_active": true,
        "avatar_url": null
    })
}

pub fn config_json(key: &str, value: &str, description: &str) -> Value {
    json!({
        "key": key,
        "value": value,
        "description": description
    })
}

impl Backend {
    pub fn with_admin() -> Self {
        let me = user_json(1, "admin@example.com", "admin");
        Self {
            me: me.clone(),
            users: vec![
                me,
                user_json(2, "user@example.com", "user"),
                user_json(3, "viewer@example.com", "viewer"),
            ],
            configs: vec![
                config_json("app_name", "Opsdeck", "Application name"),
                config_json("theme", "dark", "UI theme"),
            ],
            fail_role_update: None,
            fail_profile_update: None,
            counters: Counters::default(),
            last_config_body: None,
        }
    }

    pub fn with_regular_user() -> Self {
        let mut backend = Self::with_admin();
        backend.me = user_json(2, "user@example.com", "user");
        backend
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn get_me(State(state): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.lock().unwrap().me.clone()).into_response()
}

async fn update_me(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    if let Some((status, detail)) = state.fail_profile_update {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({"detail": detail})),
        )
            .into_response();
    }
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            state.me[key] = value.clone();
        }
    }
    Json(state.me.clone()).into_response()
}

async fn upload_avatar(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let field = multipart
        .next_field()
        .await
        .expect("Malformed multipart body")
        .expect("Missing file part");
    assert_eq!(field.name(), Some("file"));
    let file_name = field.file_name().unwrap_or("avatar").to_string();

    let mut state = state.lock().unwrap();
    let id = state.me["id"].as_i64().unwrap();
    state.me["avatar_url"] = json!(format!("/uploads/avatars/{}_{}", id, file_name));
    Json(state.me.clone()).into_response()
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.counters.users_list += 1;
    Json(Value::Array(state.users.clone())).into_response()
}

async fn update_role(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.counters.role_updates += 1;
    if let Some((status, detail)) = state.fail_role_update {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({"detail": detail})),
        )
            .into_response();
    }
    let Some(user) = state
        .users
        .iter_mut()
        .find(|u| u["id"].as_i64() == Some(user_id))
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "User not found"})),
        )
            .into_response();
    };
    user["role"] = body["role"].clone();
    Json(user.clone()).into_response()
}

async fn list_configs(State(state): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.counters.config_list += 1;
    Json(Value::Array(state.configs.clone())).into_response()
}

async fn update_config(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.counters.config_updates += 1;
    state.last_config_body = Some(body.clone());
    let Some(entry) = state
        .configs
        .iter_mut()
        .find(|c| c["key"].as_str() == Some(&key))
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Configuration not found"})),
        )
            .into_response();
    };
    entry["value"] = body["value"].clone();
    if !body["description"].is_null() {
        entry["description"] = body["description"].clone();
    }
    Json(entry.clone()).into_response()
}

/// Spawn the mock backend, returning its base URL and shared state
pub async fn spawn_backend(backend: Backend) -> (String, Shared) {
    let shared: Shared = Arc::new(Mutex::new(backend));

    let api = Router::new()
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/avatar", post(upload_avatar))
        .route("/users/", get(list_users))
        .route("/users/{id}/role", put(update_role))
        .route("/config/", get(list_configs))
        .route("/config/{key}", put(update_config))
        .with_state(shared.clone());
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), shared)
}

/// Build a client with an in-memory session already holding the token
pub fn logged_in_client(base_url: &str) -> (ApiClient, SessionContext) {
    let session = SessionContext::in_memory();
    session.establish(TOKEN).unwrap();
    let client = ApiClient::new(
        ApiClientConfig::default().with_base_url(base_url),
        session.clone(),
    )
    .expect("Failed to build client");
    (client, session)
}

/// Audit notifier that records events for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<AuditEvent>>,
}

#[async_trait::async_trait]
impl AuditNotifier for RecordingNotifier {
    async fn notify(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecordingNotifier {
    pub fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}
