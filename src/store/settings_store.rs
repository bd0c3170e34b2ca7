use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::api::SettingsApi;
use crate::errors::AppResult;
use crate::models::settings::{
    DefaultModelSettings, DisplaySettings, GeneralSettings, ServerUserSettings, UserSettings,
};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct SettingsState {
    settings: UserSettings,
    default_model_settings: DefaultModelSettings,
    general_settings: GeneralSettings,
    display_settings: DisplaySettings,
    server_settings: Option<ServerUserSettings>,
}

/// Client preferences. The four local blobs live only in durable storage;
/// the server-side record is cached separately.
pub struct SettingsStore {
    api: SettingsApi,
    mirror: Mirror,
    state: RwLock<SettingsState>,
}

impl SettingsStore {
    pub fn new(api: SettingsApi, mirror: Mirror) -> Self {
        Self { api, mirror, state: RwLock::new(SettingsState::default()) }
    }

    pub async fn settings(&self) -> UserSettings {
        self.state.read().await.settings.clone()
    }

    pub async fn default_model_settings(&self) -> DefaultModelSettings {
        self.state.read().await.default_model_settings.clone()
    }

    pub async fn general_settings(&self) -> GeneralSettings {
        self.state.read().await.general_settings.clone()
    }

    pub async fn display_settings(&self) -> DisplaySettings {
        self.state.read().await.display_settings.clone()
    }

    pub async fn server_settings(&self) -> Option<ServerUserSettings> {
        self.state.read().await.server_settings.clone()
    }

    pub async fn update_settings(&self, patch: impl FnOnce(&mut UserSettings)) -> UserSettings {
        let mut state = self.state.write().await;
        patch(&mut state.settings);
        self.mirror.save(keys::USER_SETTINGS, &state.settings);
        state.settings.clone()
    }

    pub async fn update_default_model_settings(
        &self,
        patch: impl FnOnce(&mut DefaultModelSettings),
    ) -> DefaultModelSettings {
        let mut state = self.state.write().await;
        patch(&mut state.default_model_settings);
        self.mirror.save(keys::DEFAULT_MODEL_SETTINGS, &state.default_model_settings);
        state.default_model_settings.clone()
    }

    pub async fn update_general_settings(&self, patch: impl FnOnce(&mut GeneralSettings)) -> GeneralSettings {
        let mut state = self.state.write().await;
        patch(&mut state.general_settings);
        self.mirror.save(keys::GENERAL_SETTINGS, &state.general_settings);
        state.general_settings.clone()
    }

    pub async fn update_display_settings(&self, patch: impl FnOnce(&mut DisplaySettings)) -> DisplaySettings {
        let mut state = self.state.write().await;
        patch(&mut state.display_settings);
        self.mirror.save(keys::DISPLAY_SETTINGS, &state.display_settings);
        state.display_settings.clone()
    }

    /// Rehydrates every local blob. Each one is independent: a missing or
    /// corrupt entry keeps its current value without affecting the others.
    pub async fn load_settings(&self) {
        let mut state = self.state.write().await;
        if let Some(settings) = self.mirror.load(keys::USER_SETTINGS) {
            state.settings = settings;
        }
        if let Some(settings) = self.mirror.load(keys::DEFAULT_MODEL_SETTINGS) {
            state.default_model_settings = settings;
        }
        if let Some(settings) = self.mirror.load(keys::GENERAL_SETTINGS) {
            state.general_settings = settings;
        }
        if let Some(settings) = self.mirror.load(keys::DISPLAY_SETTINGS) {
            state.display_settings = settings;
        }
        debug!("Local settings loaded");
    }

    pub async fn load_user_settings(&self) -> AppResult<ServerUserSettings> {
        let settings = self.api.get_user_settings().await.map_err(|e| {
            error!("Failed to load user settings: {e}");
            e
        })?;
        self.state.write().await.server_settings = Some(settings.clone());
        Ok(settings)
    }

    /// Updates the server record when one exists, creates it otherwise.
    pub async fn save_user_settings(&self, settings: &ServerUserSettings) -> AppResult<ServerUserSettings> {
        let exists = settings.id.is_some()
            || self.state.read().await.server_settings.as_ref().is_some_and(|s| s.id.is_some());
        let saved = if exists {
            self.api.update_user_settings(settings).await
        } else {
            self.api.create_user_settings(settings).await
        }
        .map_err(|e| {
            error!("Failed to save user settings: {e}");
            e
        })?;

        self.state.write().await.server_settings = Some(saved.clone());
        Ok(saved)
    }

    pub async fn delete_user_settings(&self) -> AppResult<()> {
        self.api.delete_user_settings().await.map_err(|e| {
            error!("Failed to delete user settings: {e}");
            e
        })?;
        self.state.write().await.server_settings = None;
        Ok(())
    }
}
