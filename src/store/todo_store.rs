use tokio::sync::RwLock;
use tracing::error;

use super::rehydrate;
use crate::api::TodoApi;
use crate::errors::AppResult;
use crate::models::todo::{CreateTodoRequest, Todo, TodoQuery, TodoStats, TodoStatus, UpdateTodoRequest};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct TodoState {
    todos: Vec<Todo>,
    current_todo: Option<Todo>,
    loading: bool,
}

/// Todo items with status-derived views. The counts in [`TodoStore::stats`]
/// are always recomputed from the cached collection.
pub struct TodoStore {
    api: TodoApi,
    mirror: Mirror,
    state: RwLock<TodoState>,
}

fn filter_by_status(todos: &[Todo], status: TodoStatus) -> Vec<Todo> {
    todos.iter().filter(|t| t.status == status).cloned().collect()
}

fn summarize(todos: &[Todo]) -> TodoStats {
    todos.iter().fold(
        TodoStats { total: todos.len(), ..TodoStats::default() },
        |mut stats, todo| {
            match todo.status {
                TodoStatus::Pending => stats.pending += 1,
                TodoStatus::InProgress => stats.in_progress += 1,
                TodoStatus::Completed => stats.completed += 1,
            }
            stats
        },
    )
}

impl TodoStore {
    pub fn new(api: TodoApi, mirror: Mirror) -> Self {
        Self { api, mirror, state: RwLock::new(TodoState::default()) }
    }

    pub async fn todos(&self) -> Vec<Todo> {
        self.state.read().await.todos.clone()
    }

    pub async fn current_todo(&self) -> Option<Todo> {
        self.state.read().await.current_todo.clone()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn todos_by_status(&self, status: TodoStatus) -> Vec<Todo> {
        filter_by_status(&self.state.read().await.todos, status)
    }

    pub async fn pending_todos(&self) -> Vec<Todo> {
        self.todos_by_status(TodoStatus::Pending).await
    }

    pub async fn in_progress_todos(&self) -> Vec<Todo> {
        self.todos_by_status(TodoStatus::InProgress).await
    }

    pub async fn completed_todos(&self) -> Vec<Todo> {
        self.todos_by_status(TodoStatus::Completed).await
    }

    pub async fn stats(&self) -> TodoStats {
        summarize(&self.state.read().await.todos)
    }

    /// Only an unfiltered listing is mirrored; a filtered page would
    /// otherwise replace the cached full list.
    pub async fn load_todos(&self, query: &TodoQuery) -> AppResult<Vec<Todo>> {
        self.state.write().await.loading = true;
        let result = self.api.get_todos(query).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(todos) => {
                if query.is_empty() {
                    self.mirror.save(keys::TODOS, &todos);
                }
                state.todos = todos.clone();
                Ok(todos)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, keys::TODOS, "todos", &e) {
                    state.todos = cached;
                }
                Err(e)
            }
        }
    }

    pub async fn create_todo(&self, request: &CreateTodoRequest) -> AppResult<Todo> {
        let todo = self.api.create_todo(request).await.map_err(|e| {
            error!("Failed to create todo: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.todos.insert(0, todo.clone());
        self.mirror.save(keys::TODOS, &state.todos);
        Ok(todo)
    }

    pub async fn update_todo(&self, todo_id: i64, request: &UpdateTodoRequest) -> AppResult<Todo> {
        let updated = self.api.update_todo(todo_id, request).await.map_err(|e| {
            error!("Failed to update todo {todo_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.todos.iter_mut().find(|t| t.id == todo_id) {
            *slot = updated.clone();
        }
        if state.current_todo.as_ref().is_some_and(|t| t.id == todo_id) {
            state.current_todo = Some(updated.clone());
        }
        self.mirror.save(keys::TODOS, &state.todos);
        Ok(updated)
    }

    pub async fn update_todo_status(&self, todo_id: i64, status: TodoStatus) -> AppResult<Todo> {
        let request = UpdateTodoRequest { status: Some(status), ..UpdateTodoRequest::default() };
        self.update_todo(todo_id, &request).await
    }

    pub async fn delete_todo(&self, todo_id: i64) -> AppResult<()> {
        self.api.delete_todo(todo_id).await.map_err(|e| {
            error!("Failed to delete todo {todo_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.todos.retain(|t| t.id != todo_id);
        if state.current_todo.as_ref().is_some_and(|t| t.id == todo_id) {
            state.current_todo = None;
        }
        self.mirror.save(keys::TODOS, &state.todos);
        Ok(())
    }

    pub async fn batch_delete_todos(&self, todo_ids: &[i64]) -> AppResult<()> {
        self.api.batch_delete_todos(todo_ids).await.map_err(|e| {
            error!("Failed to delete todos {todo_ids:?}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.todos.retain(|t| !todo_ids.contains(&t.id));
        if state.current_todo.as_ref().is_some_and(|t| todo_ids.contains(&t.id)) {
            state.current_todo = None;
        }
        self.mirror.save(keys::TODOS, &state.todos);
        Ok(())
    }

    /// Fetches a single todo and makes it current.
    pub async fn get_todo(&self, todo_id: i64) -> AppResult<Todo> {
        let todo = self.api.get_todo(todo_id).await.map_err(|e| {
            error!("Failed to fetch todo {todo_id}: {e}");
            e
        })?;
        self.state.write().await.current_todo = Some(todo.clone());
        Ok(todo)
    }

    /// The server's own summary. Returned as is; [`TodoStore::stats`] keeps
    /// reflecting the local collection.
    pub async fn load_server_stats(&self) -> AppResult<TodoStats> {
        self.api.get_todo_stats().await.map_err(|e| {
            error!("Failed to load todo stats: {e}");
            e
        })
    }

    pub async fn clear_todos(&self) {
        let mut state = self.state.write().await;
        state.todos.clear();
        state.current_todo = None;
        self.mirror.remove(keys::TODOS);
    }
}
