use serde_json::Value;

use super::client::HttpClient;
use crate::errors::{AppError, AppResult};
use crate::models::catalog::{ModelConfig, ModelConfigUpdate, ModelListQuery};
use crate::models::MessageResponse;

#[derive(Clone)]
pub struct ModelApi {
    http: HttpClient,
}

impl ModelApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get_models(&self, query: &ModelListQuery) -> AppResult<Vec<ModelConfig>> {
        self.http.get_with_query("/models", query).await
    }

    pub async fn get_active_models(&self) -> AppResult<Vec<ModelConfig>> {
        self.http.get("/models/active").await
    }

    /// A 404 means no default is configured, reported as `NotFound`.
    pub async fn get_default_model(&self) -> AppResult<ModelConfig> {
        self.http.get("/models/default").await.map_err(|e| {
            if e.is_not_found() {
                AppError::not_found("Default model", "default")
            } else {
                e
            }
        })
    }

    pub async fn get_model(&self, model_id: i64) -> AppResult<ModelConfig> {
        self.http.get(&format!("/models/{model_id}")).await
    }

    pub async fn create_model(&self, model: &ModelConfigUpdate) -> AppResult<ModelConfig> {
        self.http.post("/models", model).await
    }

    pub async fn update_model(&self, model_id: i64, model: &ModelConfigUpdate) -> AppResult<ModelConfig> {
        self.http.put(&format!("/models/{model_id}"), model).await
    }

    pub async fn delete_model(&self, model_id: i64) -> AppResult<MessageResponse> {
        self.http.delete(&format!("/models/{model_id}")).await
    }

    pub async fn set_default_model(&self, model_id: i64) -> AppResult<MessageResponse> {
        self.http.post_empty(&format!("/models/{model_id}/set-default")).await
    }

    pub async fn test_model(&self, model_id: i64) -> AppResult<Value> {
        self.http.post_empty(&format!("/models/{model_id}/test")).await
    }

    pub async fn get_models_by_provider(&self, provider: &str) -> AppResult<Vec<ModelConfig>> {
        self.http.get(&format!("/models/providers/{provider}")).await
    }
}
