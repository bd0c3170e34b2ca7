use tokio::sync::RwLock;
use tracing::error;

use super::rehydrate;
use crate::api::PromptApi;
use crate::errors::AppResult;
use crate::models::catalog::{CatalogQuery, PromptTemplate, PromptTemplateUpdate};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct PromptState {
    prompts: Vec<PromptTemplate>,
    is_loading: bool,
}

pub struct PromptStore {
    api: PromptApi,
    mirror: Mirror,
    state: RwLock<PromptState>,
}

impl PromptStore {
    pub fn new(api: PromptApi, mirror: Mirror) -> Self {
        Self { api, mirror, state: RwLock::new(PromptState::default()) }
    }

    pub async fn prompts(&self) -> Vec<PromptTemplate> {
        self.state.read().await.prompts.clone()
    }

    pub async fn active_prompts(&self) -> Vec<PromptTemplate> {
        self.state
            .read()
            .await
            .prompts
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn load_prompts(&self) -> AppResult<Vec<PromptTemplate>> {
        self.state.write().await.is_loading = true;
        let result = self.api.get_prompts(&CatalogQuery::default()).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(prompts) => {
                self.mirror.save(keys::PROMPTS, &prompts);
                state.prompts = prompts.clone();
                Ok(prompts)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, keys::PROMPTS, "prompt templates", &e) {
                    state.prompts = cached;
                }
                Err(e)
            }
        }
    }

    pub async fn create_prompt(&self, prompt: &PromptTemplateUpdate) -> AppResult<PromptTemplate> {
        let created = self.api.create_prompt(prompt).await.map_err(|e| {
            error!("Failed to create prompt template: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.prompts.insert(0, created.clone());
        self.mirror.save(keys::PROMPTS, &state.prompts);
        Ok(created)
    }

    pub async fn update_prompt(&self, prompt_id: i64, prompt: &PromptTemplateUpdate) -> AppResult<PromptTemplate> {
        let updated = self.api.update_prompt(prompt_id, prompt).await.map_err(|e| {
            error!("Failed to update prompt template {prompt_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.prompts.iter_mut().find(|p| p.id == prompt_id) {
            *slot = updated.clone();
        }
        self.mirror.save(keys::PROMPTS, &state.prompts);
        Ok(updated)
    }

    pub async fn delete_prompt(&self, prompt_id: i64) -> AppResult<()> {
        self.api.delete_prompt(prompt_id).await.map_err(|e| {
            error!("Failed to delete prompt template {prompt_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.prompts.retain(|p| p.id != prompt_id);
        self.mirror.save(keys::PROMPTS, &state.prompts);
        Ok(())
    }
}
