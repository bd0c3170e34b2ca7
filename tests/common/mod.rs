//! Shared fixtures: an in-process mock backend and an `AppState` wired to it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use llm_chat_client::storage::{KeyValueStore, MemoryStore};
use llm_chat_client::{AppConfig, AppState};
use serde_json::{json, Value};

/// Serves `api` under `/api/v1` on an ephemeral port and returns the base URL.
pub async fn spawn_backend(api: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock backend");
    let addr = listener.local_addr().expect("mock backend has no address");
    let app = Router::new().nest("/api/v1", api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });
    format!("http://{addr}/api/v1")
}

pub fn app_state(base_url: &str) -> (AppState, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let config = AppConfig { api_base_url: base_url.to_string(), ..AppConfig::default() };
    let state = AppState::new(config, storage.clone() as Arc<dyn KeyValueStore>)
        .expect("failed to build app state");
    (state, storage)
}

/// A backend address nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/v1")
}

// ── Payload builders ───────────────────────────────────────────

pub fn conversation(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "user_id": 1,
        "model_config_id": 1,
        "message_count": 0,
        "is_active": true,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

pub fn message(id: i64, conversation_id: i64, role: &str, content: &str) -> Value {
    json!({
        "id": id,
        "conversation_id": conversation_id,
        "role": role,
        "content": content,
        "token_count": 3,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

pub fn user(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "is_active": true,
        "is_admin": false,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

pub fn model(id: i64, name: &str, is_active: bool, is_default: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "provider": "openai",
        "model_name": name,
        "temperature": "0.7",
        "max_tokens": 2000,
        "is_active": is_active,
        "is_default": is_default
    })
}

pub fn todo(id: i64, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "title": title,
        "status": status,
        "create_time": "2026-01-01T00:00:00Z"
    })
}
