use serde_json::Value;

use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::todo::{
    BatchDeleteRequest, CreateTodoRequest, Todo, TodoListResponse, TodoQuery, TodoStats,
    UpdateTodoRequest,
};

#[derive(Clone)]
pub struct TodoApi {
    http: HttpClient,
}

impl TodoApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create_todo(&self, request: &CreateTodoRequest) -> AppResult<Todo> {
        self.http.post("/todos/", request).await
    }

    pub async fn get_todos(&self, query: &TodoQuery) -> AppResult<Vec<Todo>> {
        let response: TodoListResponse = if query.is_empty() {
            self.http.get("/todos/").await?
        } else {
            self.http.get_with_query("/todos", query).await?
        };
        Ok(response.into_items())
    }

    pub async fn get_todo(&self, todo_id: i64) -> AppResult<Todo> {
        self.http.get(&format!("/todos/{todo_id}")).await
    }

    pub async fn update_todo(&self, todo_id: i64, request: &UpdateTodoRequest) -> AppResult<Todo> {
        self.http.put(&format!("/todos/{todo_id}"), request).await
    }

    pub async fn delete_todo(&self, todo_id: i64) -> AppResult<Value> {
        self.http.delete(&format!("/todos/{todo_id}")).await
    }

    pub async fn batch_delete_todos(&self, todo_ids: &[i64]) -> AppResult<Value> {
        self.http
            .delete_with_body("/todos/batch", &BatchDeleteRequest { todo_ids })
            .await
    }

    pub async fn get_todo_stats(&self) -> AppResult<TodoStats> {
        self.http.get("/todos/stats/summary").await
    }
}
