//! HTTP client plus one module per backend resource.
//!
//! API structs hold nothing but a handle to the shared [`HttpClient`]; each
//! method maps its inputs onto a JSON body, query string or multipart form
//! and returns the decoded payload.

pub mod auth_api;
pub mod chat_api;
pub mod client;
pub mod image_api;
pub mod knowledge_api;
pub mod mcp_api;
pub mod model_api;
pub mod prompt_api;
pub mod settings_api;
pub mod todo_api;

pub use auth_api::{AuthApi, ProfileApi};
pub use chat_api::{chat_events, ChatApi, ChatStreamDecoder};
pub use client::{ByteStream, HttpClient, SessionEvent};
pub use image_api::ImageApi;
pub use knowledge_api::KnowledgeApi;
pub use mcp_api::McpApi;
pub use model_api::ModelApi;
pub use prompt_api::PromptApi;
pub use settings_api::SettingsApi;
pub use todo_api::TodoApi;

/// Every API module over one shared client.
#[derive(Clone)]
pub struct Api {
    pub http: HttpClient,
    pub auth: AuthApi,
    pub profile: ProfileApi,
    pub chat: ChatApi,
    pub images: ImageApi,
    pub knowledge: KnowledgeApi,
    pub mcp: McpApi,
    pub models: ModelApi,
    pub prompts: PromptApi,
    pub settings: SettingsApi,
    pub todos: TodoApi,
}

impl Api {
    pub fn new(http: HttpClient) -> Self {
        Self {
            auth: AuthApi::new(http.clone()),
            profile: ProfileApi::new(http.clone()),
            chat: ChatApi::new(http.clone()),
            images: ImageApi::new(http.clone()),
            knowledge: KnowledgeApi::new(http.clone()),
            mcp: McpApi::new(http.clone()),
            models: ModelApi::new(http.clone()),
            prompts: PromptApi::new(http.clone()),
            settings: SettingsApi::new(http.clone()),
            todos: TodoApi::new(http.clone()),
            http,
        }
    }
}
