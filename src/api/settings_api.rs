use serde_json::Value;

use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::settings::ServerUserSettings;

/// Server-side user settings and data maintenance endpoints.
#[derive(Clone)]
pub struct SettingsApi {
    http: HttpClient,
}

impl SettingsApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get_user_settings(&self) -> AppResult<ServerUserSettings> {
        self.http.get("/user-settings").await
    }

    pub async fn create_user_settings(&self, settings: &ServerUserSettings) -> AppResult<ServerUserSettings> {
        self.http.post("/user-settings", settings).await
    }

    pub async fn update_user_settings(&self, settings: &ServerUserSettings) -> AppResult<ServerUserSettings> {
        self.http.put("/user-settings", settings).await
    }

    pub async fn delete_user_settings(&self) -> AppResult<Value> {
        self.http.delete("/user-settings").await
    }

    pub async fn generate_title(&self, request: &Value) -> AppResult<Value> {
        self.http.post("/user-settings/generate-title", request).await
    }

    pub async fn get_data_directories(&self) -> AppResult<Value> {
        self.http.get("/user-settings/data-directories").await
    }

    pub async fn clear_cache(&self) -> AppResult<Value> {
        self.http.post_empty("/user-settings/clear-cache").await
    }

    pub async fn delete_knowledge_files(&self) -> AppResult<Value> {
        self.http.post_empty("/user-settings/delete-knowledge-files").await
    }

    pub async fn reset_all_data(&self) -> AppResult<Value> {
        self.http.post_empty("/user-settings/reset-all-data").await
    }

    pub async fn get_system_info(&self) -> AppResult<Value> {
        self.http.get("/user-settings/system-info").await
    }
}
