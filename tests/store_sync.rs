//! Store caching against a mock backend: load-and-mirror, fallback to the
//! mirror, and in-place patches after mutations.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use common::{app_state, conversation, message, model, spawn_backend, todo, unreachable_base_url};
use llm_chat_client::models::chat::{Conversation, ConversationCreateRequest};
use llm_chat_client::models::catalog::ModelConfig;
use llm_chat_client::models::todo::{CreateTodoRequest, Todo, TodoQuery, TodoStatus};
use llm_chat_client::storage::{keys, KeyValueStore};

fn stored<T: serde::de::DeserializeOwned>(storage: &impl KeyValueStore, key: &str) -> T {
    serde_json::from_str(&storage.get(key).expect("key should be stored")).expect("stored value should parse")
}

// ── Conversations ──────────────────────────────────────────────

fn chat_backend() -> Router {
    Router::new()
        .route(
            "/conversations",
            get(|| async { Json(json!([conversation(1, "first"), conversation(2, "second")])) }),
        )
        .route(
            "/conversations/{id}",
            get(|Path(id): Path<i64>| async move { Json(conversation(id, "created")) })
                .delete(|| async { Json(json!({"message": "deleted"})) }),
        )
        .route(
            "/conversations/{id}/title",
            axum::routing::put(|| async { Json(json!({"message": "updated"})) }),
        )
        .route(
            "/chat/conversations",
            post(|| async { Json(json!({"conversation_id": 9, "title": "created", "message": "ok"})) }),
        )
        .route(
            "/chat/conversations/{id}/messages",
            get(|Path(id): Path<i64>| async move {
                Json(json!({
                    "messages": [message(10, id, "user", "hi"), message(11, id, "assistant", "hello")],
                    "total_count": 2,
                    "conversation_id": id
                }))
            }),
        )
}

#[tokio::test]
async fn loaded_conversations_are_mirrored() {
    let base = spawn_backend(chat_backend()).await;
    let (state, storage) = app_state(&base);

    let loaded = state.chat.load_conversations().await.unwrap();

    assert_eq!(loaded.len(), 2);
    let mirrored: Vec<Conversation> = stored(&*storage, keys::CONVERSATIONS);
    assert_eq!(mirrored, state.chat.conversations().await);
}

#[tokio::test]
async fn failed_load_rehydrates_and_still_errors() {
    let api = Router::new().route("/conversations", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = spawn_backend(api).await;
    let (state, storage) = app_state(&base);
    storage
        .set(keys::CONVERSATIONS, &json!([conversation(5, "cached")]).to_string())
        .unwrap();

    let err = state.chat.load_conversations().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let conversations = state.chat.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "cached");
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_cached_models() {
    let base = unreachable_base_url().await;
    let (state, storage) = app_state(&base);
    storage
        .set(keys::MODELS, &json!([model(3, "cached", true, true)]).to_string())
        .unwrap();

    let err = state.models.load_models().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(state.models.models().await[0].id, 3);
    assert!(!state.models.is_loading().await);
}

#[tokio::test]
async fn failed_message_load_rehydrates_that_conversation() {
    let api = Router::new().route(
        "/chat/conversations/{id}/messages",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn_backend(api).await;
    let (state, storage) = app_state(&base);
    storage
        .set(&keys::messages(7), &json!([message(70, 7, "user", "cached")]).to_string())
        .unwrap();
    storage
        .set(&keys::messages(8), &json!([message(80, 8, "user", "other")]).to_string())
        .unwrap();

    let err = state.chat.load_conversation_messages(7).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let messages = state.chat.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "cached");
    assert!(!state.chat.is_loading().await);
}

#[tokio::test]
async fn corrupt_cache_leaves_loaded_conversations_untouched() {
    let failing = Arc::new(AtomicBool::new(false));
    let flag = failing.clone();
    let api = Router::new().route(
        "/conversations",
        get(move || {
            let flag = flag.clone();
            async move {
                if flag.load(Ordering::SeqCst) {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                } else {
                    Json(json!([conversation(1, "live")])).into_response()
                }
            }
        }),
    );
    let base = spawn_backend(api).await;
    let (state, storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();

    storage.set(keys::CONVERSATIONS, "{not json").unwrap();
    failing.store(true, Ordering::SeqCst);
    let err = state.chat.load_conversations().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let conversations = state.chat.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "live");
}

#[tokio::test]
async fn messages_are_mirrored_per_conversation() {
    let base = spawn_backend(chat_backend()).await;
    let (state, storage) = app_state(&base);

    state.chat.load_conversation_messages(4).await.unwrap();

    assert_eq!(state.chat.messages().await.len(), 2);
    assert!(storage.get(&keys::messages(4)).is_some());
}

#[tokio::test]
async fn created_conversation_becomes_current_at_the_front() {
    let base = spawn_backend(chat_backend()).await;
    let (state, storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();

    let request = ConversationCreateRequest {
        title: "created".to_string(),
        model_config_id: 1,
        knowledge_base_id: None,
        prompt_template_id: None,
    };
    let created = state.chat.create_conversation(&request).await.unwrap();

    assert_eq!(created.id, 9);
    assert_eq!(state.chat.current_conversation_id().await, Some(9));
    assert_eq!(state.chat.conversations().await[0].id, 9);
    let mirrored: Vec<Conversation> = stored(&*storage, keys::CONVERSATIONS);
    assert_eq!(mirrored.len(), 3);
}

#[tokio::test]
async fn deleting_another_conversation_keeps_the_selection() {
    let base = spawn_backend(chat_backend()).await;
    let (state, _storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();
    state.chat.set_current_conversation(Some(1)).await;
    state.chat.load_conversation_messages(1).await.unwrap();

    state.chat.delete_conversation(2).await.unwrap();

    assert_eq!(state.chat.current_conversation_id().await, Some(1));
    assert_eq!(state.chat.messages().await.len(), 2);
    assert_eq!(state.chat.conversations().await.len(), 1);
}

#[tokio::test]
async fn deleting_the_current_conversation_clears_it() {
    let base = spawn_backend(chat_backend()).await;
    let (state, storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();
    state.chat.set_current_conversation(Some(1)).await;
    state.chat.load_conversation_messages(1).await.unwrap();

    state.chat.delete_conversation(1).await.unwrap();

    assert_eq!(state.chat.current_conversation_id().await, None);
    assert!(state.chat.messages().await.is_empty());
    assert!(storage.get(&keys::messages(1)).is_none());
    let mirrored: Vec<Conversation> = stored(&*storage, keys::CONVERSATIONS);
    assert_eq!(mirrored.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn title_update_patches_in_place() {
    let base = spawn_backend(chat_backend()).await;
    let (state, _storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();

    state.chat.update_conversation_title(2, "renamed").await.unwrap();

    let conversations = state.chat.conversations().await;
    assert_eq!(conversations[1].title, "renamed");
    assert_eq!(conversations[0].title, "first");
}

#[tokio::test]
async fn saved_chat_state_restores_into_a_fresh_store() {
    let base = spawn_backend(chat_backend()).await;
    let (state, storage) = app_state(&base);
    state.chat.load_conversations().await.unwrap();
    state.chat.set_current_conversation(Some(2)).await;
    state.chat.load_conversation_messages(2).await.unwrap();
    state.chat.save_to_storage().await;

    let config = llm_chat_client::AppConfig { api_base_url: base, ..Default::default() };
    let restored = llm_chat_client::AppState::new(config, storage.clone()).unwrap();
    restored.chat.restore_from_storage().await;

    assert_eq!(restored.chat.current_conversation_id().await, Some(2));
    assert_eq!(restored.chat.conversations().await.len(), 2);
    assert_eq!(restored.chat.messages().await.len(), 2);
    assert_eq!(restored.chat.current_conversation().await.unwrap().title, "second");
}

// ── Models ─────────────────────────────────────────────────────

fn model_backend() -> Router {
    Router::new()
        .route(
            "/models/active",
            get(|| async {
                Json(json!([
                    model(1, "a", true, true),
                    model(2, "b", false, false),
                    model(3, "c", true, false)
                ]))
            }),
        )
        .route("/models/default", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/models/{id}/set-default",
            post(|| async { Json(json!({"message": "default set"})) }),
        )
}

#[tokio::test]
async fn active_models_match_the_filter() {
    let base = spawn_backend(model_backend()).await;
    let (state, storage) = app_state(&base);

    state.models.load_models().await.unwrap();

    let expected: Vec<ModelConfig> =
        state.models.models().await.into_iter().filter(|m| m.is_active).collect();
    assert_eq!(state.models.active_models().await, expected);
    assert_eq!(expected.len(), 2);
    let mirrored: Vec<ModelConfig> = stored(&*storage, keys::MODELS);
    assert_eq!(mirrored.len(), 3);
}

#[tokio::test]
async fn mark_default_leaves_exactly_one_default() {
    let base = spawn_backend(model_backend()).await;
    let (state, _storage) = app_state(&base);
    state.models.load_models().await.unwrap();

    state.models.mark_default(3).await.unwrap();

    let defaults: Vec<i64> = state
        .models
        .models()
        .await
        .into_iter()
        .filter(|m| m.is_default)
        .map(|m| m.id)
        .collect();
    assert_eq!(defaults, vec![3]);
    assert_eq!(state.models.default_model().await.unwrap().id, 3);
}

#[tokio::test]
async fn missing_default_model_is_not_an_error() {
    let base = spawn_backend(model_backend()).await;
    let (state, _storage) = app_state(&base);

    assert_eq!(state.models.load_default_model().await.unwrap(), None);
    assert_eq!(state.models.default_model().await, None);
}

// ── Todos ──────────────────────────────────────────────────────

async fn batch_delete(Json(body): Json<Value>) -> Response {
    if body == json!({"todo_ids": [1, 3]}) {
        Json(json!({"message": "deleted 2 todos"})).into_response()
    } else {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": "unexpected body"}))).into_response()
    }
}

fn todo_backend() -> Router {
    Router::new()
        .route(
            "/todos/",
            get(|| async {
                Json(json!([
                    todo(1, "one", "pending"),
                    todo(2, "two", "in_progress"),
                    todo(3, "three", "completed")
                ]))
            })
            .post(|Json(body): Json<Value>| async move {
                Json(todo(4, body["title"].as_str().unwrap_or_default(), "pending"))
            }),
        )
        .route(
            "/todos",
            get(|| async { Json(json!({"items": [todo(3, "three", "completed")]})) }),
        )
        .route("/todos/batch", delete(batch_delete))
        .route(
            "/todos/{id}",
            axum::routing::put(|Path(id): Path<i64>| async move { Json(todo(id, "two", "completed")) })
                .delete(|| async { Json(json!({"message": "deleted"})) }),
        )
        .route(
            "/todos/stats/summary",
            get(|| async { Json(json!({"total": 10, "pending": 5, "in_progress": 3, "completed": 2})) }),
        )
}

#[tokio::test]
async fn batch_delete_removes_only_the_given_ids() {
    let base = spawn_backend(todo_backend()).await;
    let (state, storage) = app_state(&base);
    state.todos.load_todos(&TodoQuery::default()).await.unwrap();

    state.todos.batch_delete_todos(&[1, 3]).await.unwrap();

    let remaining: Vec<i64> = state.todos.todos().await.iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec![2]);
    assert_eq!(state.todos.stats().await.total, 1);
    let mirrored: Vec<Todo> = stored(&*storage, keys::TODOS);
    assert_eq!(mirrored.len(), 1);
}

#[tokio::test]
async fn derived_todo_views_follow_mutations() {
    let base = spawn_backend(todo_backend()).await;
    let (state, _storage) = app_state(&base);
    state.todos.load_todos(&TodoQuery::default()).await.unwrap();

    state.todos.update_todo_status(2, TodoStatus::Completed).await.unwrap();
    let created = state
        .todos
        .create_todo(&CreateTodoRequest { title: "four".to_string(), content: None, status: None })
        .await
        .unwrap();

    assert_eq!(state.todos.todos().await[0].id, created.id);
    let completed: Vec<i64> = state.todos.completed_todos().await.iter().map(|t| t.id).collect();
    assert_eq!(completed, vec![2, 3]);
    assert!(state.todos.in_progress_todos().await.is_empty());
    let stats = state.todos.stats().await;
    assert_eq!((stats.total, stats.pending, stats.completed), (4, 2, 2));
}

#[tokio::test]
async fn server_stats_do_not_replace_derived_counts() {
    let base = spawn_backend(todo_backend()).await;
    let (state, _storage) = app_state(&base);
    state.todos.load_todos(&TodoQuery::default()).await.unwrap();

    let server = state.todos.load_server_stats().await.unwrap();

    assert_eq!(server.total, 10);
    assert_eq!(state.todos.stats().await.total, 3);
}

#[tokio::test]
async fn filtered_todo_query_accepts_paged_shape() {
    let base = spawn_backend(todo_backend()).await;
    let (state, _storage) = app_state(&base);

    let query = TodoQuery { status: Some(TodoStatus::Completed), ..TodoQuery::default() };
    let todos = state.todos.load_todos(&query).await.unwrap();

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].status, TodoStatus::Completed);
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_cached_todos() {
    let base = unreachable_base_url().await;
    let (state, storage) = app_state(&base);
    storage
        .set(keys::TODOS, &json!([todo(5, "cached", "pending"), todo(6, "done", "completed")]).to_string())
        .unwrap();

    let err = state.todos.load_todos(&TodoQuery::default()).await.unwrap_err();

    assert!(err.is_transport());
    let ids: Vec<i64> = state.todos.todos().await.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![5, 6]);
    assert_eq!(state.todos.stats().await.completed, 1);
}

#[tokio::test]
async fn filtered_load_keeps_the_cached_full_list() {
    let base = spawn_backend(todo_backend()).await;
    let (state, storage) = app_state(&base);
    state.todos.load_todos(&TodoQuery::default()).await.unwrap();

    let query = TodoQuery { status: Some(TodoStatus::Completed), ..TodoQuery::default() };
    state.todos.load_todos(&query).await.unwrap();

    assert_eq!(state.todos.todos().await.len(), 1);
    let mirrored: Vec<Todo> = stored(&*storage, keys::TODOS);
    assert_eq!(mirrored.len(), 3);
}
