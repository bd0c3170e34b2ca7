use tokio::sync::RwLock;
use tracing::error;

use super::rehydrate;
use crate::api::ModelApi;
use crate::errors::AppResult;
use crate::models::catalog::{ModelConfig, ModelConfigUpdate};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct ModelState {
    models: Vec<ModelConfig>,
    default_model: Option<ModelConfig>,
    is_loading: bool,
}

/// Model configurations. The server enforces a single default; this store
/// mirrors whatever it reports.
pub struct ModelStore {
    api: ModelApi,
    mirror: Mirror,
    state: RwLock<ModelState>,
}

impl ModelStore {
    pub fn new(api: ModelApi, mirror: Mirror) -> Self {
        Self { api, mirror, state: RwLock::new(ModelState::default()) }
    }

    pub async fn models(&self) -> Vec<ModelConfig> {
        self.state.read().await.models.clone()
    }

    pub async fn active_models(&self) -> Vec<ModelConfig> {
        self.state
            .read()
            .await
            .models
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect()
    }

    pub async fn default_model(&self) -> Option<ModelConfig> {
        self.state.read().await.default_model.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// Points `default_model` at an entry of the cached collection, or clears
    /// it when the id is not cached. No request is made.
    pub async fn select_default_model(&self, model_id: i64) {
        let mut state = self.state.write().await;
        let selected = state.models.iter().find(|m| m.id == model_id).cloned();
        state.default_model = selected;
    }

    pub async fn load_models(&self) -> AppResult<Vec<ModelConfig>> {
        self.state.write().await.is_loading = true;
        let result = self.api.get_active_models().await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(models) => {
                self.mirror.save(keys::MODELS, &models);
                state.models = models.clone();
                Ok(models)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, keys::MODELS, "models", &e) {
                    state.models = cached;
                }
                Err(e)
            }
        }
    }

    /// `Ok(None)` when the server has no default configured.
    pub async fn load_default_model(&self) -> AppResult<Option<ModelConfig>> {
        match self.api.get_default_model().await {
            Ok(model) => {
                self.state.write().await.default_model = Some(model.clone());
                Ok(Some(model))
            }
            Err(e) if e.is_not_found() => {
                self.state.write().await.default_model = None;
                Ok(None)
            }
            Err(e) => {
                error!("Failed to load default model: {e}");
                Err(e)
            }
        }
    }

    /// Makes `model_id` the default server-side, then flips `is_default`
    /// across the cached collection so exactly that entry carries it.
    pub async fn mark_default(&self, model_id: i64) -> AppResult<()> {
        self.api.set_default_model(model_id).await.map_err(|e| {
            error!("Failed to set default model {model_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        for model in state.models.iter_mut() {
            model.is_default = model.id == model_id;
        }
        let selected = state.models.iter().find(|m| m.id == model_id).cloned();
        state.default_model = selected;
        self.mirror.save(keys::MODELS, &state.models);
        Ok(())
    }

    pub async fn create_model(&self, model: &ModelConfigUpdate) -> AppResult<ModelConfig> {
        let created = self.api.create_model(model).await.map_err(|e| {
            error!("Failed to create model: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.models.insert(0, created.clone());
        self.mirror.save(keys::MODELS, &state.models);
        Ok(created)
    }

    pub async fn update_model(&self, model_id: i64, model: &ModelConfigUpdate) -> AppResult<ModelConfig> {
        let updated = self.api.update_model(model_id, model).await.map_err(|e| {
            error!("Failed to update model {model_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.models.iter_mut().find(|m| m.id == model_id) {
            *slot = updated.clone();
        }
        if state.default_model.as_ref().is_some_and(|m| m.id == model_id) {
            state.default_model = Some(updated.clone());
        }
        self.mirror.save(keys::MODELS, &state.models);
        Ok(updated)
    }

    pub async fn delete_model(&self, model_id: i64) -> AppResult<()> {
        self.api.delete_model(model_id).await.map_err(|e| {
            error!("Failed to delete model {model_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.models.retain(|m| m.id != model_id);
        if state.default_model.as_ref().is_some_and(|m| m.id == model_id) {
            state.default_model = None;
        }
        self.mirror.save(keys::MODELS, &state.models);
        Ok(())
    }
}
