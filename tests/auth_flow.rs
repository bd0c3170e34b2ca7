//! Session lifecycle against a mock backend: login, restore, rejection.

mod common;

use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use common::{app_state, spawn_backend, user};
use llm_chat_client::models::auth::{LoginRequest, RegisterRequest};
use llm_chat_client::navigation::{Navigation, Route, RouteGuard};
use llm_chat_client::storage::{keys, KeyValueStore};

const TOKEN: &str = "tok-alice";

async fn me(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Json(user(1, "alice")).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "alice" && body["password"] == "secret" {
        Json(json!({"access_token": TOKEN, "token_type": "bearer", "expires_in": 3600})).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"detail": "Incorrect username or password"}))).into_response()
    }
}

fn auth_backend() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(|| async { Json(json!({"message": "bye"})) }))
        .route("/auth/register", post(|| async { Json(user(1, "alice")) }))
}

fn credentials(password: &str) -> LoginRequest {
    LoginRequest { username: "alice".to_string(), password: password.to_string() }
}

// ── Login ──────────────────────────────────────────────────────

#[tokio::test]
async fn login_clears_previous_account_caches_and_stores_token() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::CONVERSATIONS, r#"[{"id":7,"title":"old"}]"#).unwrap();
    storage.set(keys::CURRENT_CONVERSATION_ID, "7").unwrap();
    storage.set(&keys::messages(7), "[]").unwrap();
    storage.set(keys::TODOS, "[]").unwrap();
    storage.set(keys::KNOWLEDGE_BASES, "[]").unwrap();
    storage.set(&keys::documents(3), "[]").unwrap();
    storage.set(keys::MODELS, "[]").unwrap();
    storage.set(keys::PROMPTS, "[]").unwrap();

    let user = state.auth.login(&credentials("secret")).await.unwrap();

    assert_eq!(user.username, "alice");
    assert!(state.auth.is_authenticated().await);
    assert!(state.auth.check_auth().await);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).as_deref(), Some(TOKEN));
    assert!(storage.get(keys::USER_INFO).is_some());
    assert!(storage.get(keys::CONVERSATIONS).is_none());
    assert!(storage.get(keys::CURRENT_CONVERSATION_ID).is_none());
    assert!(storage.keys().iter().all(|k| !k.starts_with(keys::MESSAGES_PREFIX)));
    assert!(storage.get(keys::TODOS).is_none());
    assert!(storage.get(keys::KNOWLEDGE_BASES).is_none());
    assert!(storage.get(&keys::documents(3)).is_none());
    // Shared catalogs survive.
    assert!(storage.get(keys::MODELS).is_some());
    assert!(storage.get(keys::PROMPTS).is_some());
}

#[tokio::test]
async fn rejected_login_surfaces_backend_detail() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);

    let err = state.auth.login(&credentials("wrong")).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.detail(), "Incorrect username or password");
    assert!(!state.auth.is_authenticated().await);
    assert!(!state.auth.is_loading().await);
    assert!(storage.get(keys::ACCESS_TOKEN).is_none());
}

#[tokio::test]
async fn unauthorized_login_surfaces_backend_detail() {
    let api = Router::new().route(
        "/auth/login",
        post(|| async {
            (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect username or password"})))
        }),
    );
    let base = spawn_backend(api).await;
    let (state, storage) = app_state(&base);

    let err = state.auth.login(&credentials("wrong")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.detail(), "Incorrect username or password");
    assert!(!state.auth.is_authenticated().await);
    assert!(storage.get(keys::ACCESS_TOKEN).is_none());
}

#[tokio::test]
async fn register_signs_in_afterwards() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);

    let request = RegisterRequest {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "secret".to_string(),
        confirm_password: "secret".to_string(),
        nickname: None,
    };
    state.auth.register(&request).await.unwrap();

    assert!(state.auth.is_authenticated().await);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn logout_removes_credential_and_profile() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    state.auth.login(&credentials("secret")).await.unwrap();

    state.auth.logout().await;

    assert!(!state.auth.is_authenticated().await);
    assert_eq!(state.auth.user().await, None);
    assert!(storage.get(keys::ACCESS_TOKEN).is_none());
    assert!(storage.get(keys::USER_INFO).is_none());
}

// ── Restoring a session ────────────────────────────────────────

#[tokio::test]
async fn init_auth_restores_a_valid_session() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::ACCESS_TOKEN, TOKEN).unwrap();
    storage.set(keys::USER_INFO, &user(1, "stale-name").to_string()).unwrap();

    state.auth.init_auth().await;

    assert!(state.auth.is_authenticated().await);
    assert_eq!(state.auth.user().await.unwrap().username, "alice");
}

#[tokio::test]
async fn init_auth_failure_logs_out_completely() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::ACCESS_TOKEN, "expired").unwrap();
    storage.set(keys::USER_INFO, &user(1, "alice").to_string()).unwrap();

    state.auth.init_auth().await;

    assert!(!state.auth.is_authenticated().await);
    assert!(storage.get(keys::ACCESS_TOKEN).is_none());
    assert!(storage.get(keys::USER_INFO).is_none());
}

#[tokio::test]
async fn init_auth_without_profile_stays_anonymous() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::ACCESS_TOKEN, TOKEN).unwrap();

    state.auth.init_auth().await;

    assert!(!state.auth.is_authenticated().await);
}

#[tokio::test]
async fn background_validation_is_optimistic_until_it_completes() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::ACCESS_TOKEN, "expired").unwrap();
    storage.set(keys::USER_INFO, &user(1, "alice").to_string()).unwrap();

    let validation = state.auth.clone().spawn_init_auth().await.expect("session should be restored");
    assert!(state.auth.is_authenticated().await);

    validation.await.unwrap();
    assert!(!state.auth.is_authenticated().await);
}

// ── Route guard ────────────────────────────────────────────────

#[tokio::test]
async fn guard_redirects_by_session_state() {
    let base = spawn_backend(auth_backend()).await;
    let (state, _storage) = app_state(&base);

    assert_eq!(
        RouteGuard::resolve(&state.auth, Route::Todos).await,
        Navigation::Redirect(Route::Login)
    );

    state.auth.login(&credentials("secret")).await.unwrap();
    assert_eq!(
        RouteGuard::resolve(&state.auth, Route::Login).await,
        Navigation::Redirect(Route::Chat)
    );
    assert_eq!(RouteGuard::resolve(&state.auth, Route::Todos).await, Navigation::Allow);
}

#[tokio::test]
async fn guard_restores_a_persisted_session_before_deciding() {
    let base = spawn_backend(auth_backend()).await;
    let (state, storage) = app_state(&base);
    storage.set(keys::ACCESS_TOKEN, TOKEN).unwrap();
    storage.set(keys::USER_INFO, &user(1, "alice").to_string()).unwrap();

    assert_eq!(RouteGuard::resolve(&state.auth, Route::Models).await, Navigation::Allow);
}

// ── Rejection anywhere ─────────────────────────────────────────

#[tokio::test]
async fn unauthorized_response_resets_the_auth_store() {
    let api = auth_backend().route("/todos/", get(|| async { StatusCode::UNAUTHORIZED }));
    let base = spawn_backend(api).await;
    let (state, storage) = app_state(&base);
    let _watcher = state.watch_session_events();
    state.auth.login(&credentials("secret")).await.unwrap();

    let err = state.todos.load_todos(&Default::default()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(storage.get(keys::ACCESS_TOKEN).is_none());

    let reset = tokio::time::timeout(Duration::from_secs(2), async {
        while state.auth.is_authenticated().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reset.is_ok(), "auth store was not reset after a 401");
}
