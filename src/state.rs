use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{Api, HttpClient};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::storage::{FileStore, KeyValueStore, Mirror};
use crate::store::{
    AuthStore, ChatStore, KnowledgeStore, McpStore, ModelStore, PromptStore, SettingsStore,
    TodoStore,
};

/// Shared application state: every store over one HTTP client and one
/// durable store. Cheap to clone; hand it to whatever needs it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: Api,
    pub mirror: Mirror,
    pub auth: Arc<AuthStore>,
    pub chat: Arc<ChatStore>,
    pub models: Arc<ModelStore>,
    pub prompts: Arc<PromptStore>,
    pub knowledge: Arc<KnowledgeStore>,
    pub settings: Arc<SettingsStore>,
    pub todos: Arc<TodoStore>,
    pub mcp: Arc<McpStore>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let mirror = Mirror::new(storage);
        let http = HttpClient::new(&config, mirror.clone())?;
        let api = Api::new(http);

        Ok(Self {
            auth: Arc::new(AuthStore::new(api.auth.clone(), api.profile.clone(), mirror.clone())),
            chat: Arc::new(ChatStore::new(api.chat.clone(), mirror.clone())),
            models: Arc::new(ModelStore::new(api.models.clone(), mirror.clone())),
            prompts: Arc::new(PromptStore::new(api.prompts.clone(), mirror.clone())),
            knowledge: Arc::new(KnowledgeStore::new(api.knowledge.clone(), mirror.clone())),
            settings: Arc::new(SettingsStore::new(api.settings.clone(), mirror.clone())),
            todos: Arc::new(TodoStore::new(api.todos.clone(), mirror.clone())),
            mcp: Arc::new(McpStore::new(api.mcp.clone())),
            config: Arc::new(config),
            api,
            mirror,
        })
    }

    /// Builds the state over the JSON file at `config.storage_path`.
    pub fn open(config: AppConfig) -> AppResult<Self> {
        let storage = FileStore::open(config.storage_path.clone())?;
        Self::new(config, Arc::new(storage))
    }

    /// Routes session events from the HTTP layer into the auth store.
    pub fn watch_session_events(&self) -> JoinHandle<()> {
        self.auth.clone().watch_session_events(self.api.http.subscribe())
    }
}
