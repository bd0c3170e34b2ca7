use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::catalog::{CatalogQuery, PromptTemplate, PromptTemplateUpdate};
use crate::models::MessageResponse;

#[derive(Clone)]
pub struct PromptApi {
    http: HttpClient,
}

impl PromptApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get_prompts(&self, query: &CatalogQuery) -> AppResult<Vec<PromptTemplate>> {
        self.http.get_with_query("/prompts", query).await
    }

    pub async fn get_active_prompts(&self) -> AppResult<Vec<PromptTemplate>> {
        self.http.get("/prompts/active").await
    }

    pub async fn get_prompt(&self, prompt_id: i64) -> AppResult<PromptTemplate> {
        self.http.get(&format!("/prompts/{prompt_id}")).await
    }

    pub async fn create_prompt(&self, prompt: &PromptTemplateUpdate) -> AppResult<PromptTemplate> {
        self.http.post("/prompts", prompt).await
    }

    pub async fn update_prompt(
        &self,
        prompt_id: i64,
        prompt: &PromptTemplateUpdate,
    ) -> AppResult<PromptTemplate> {
        self.http.put(&format!("/prompts/{prompt_id}"), prompt).await
    }

    pub async fn delete_prompt(&self, prompt_id: i64) -> AppResult<MessageResponse> {
        self.http.delete(&format!("/prompts/{prompt_id}")).await
    }
}
