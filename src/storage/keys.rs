//! Durable storage key names. Keys are flat and not scoped per user.

pub const ACCESS_TOKEN: &str = "access_token";
pub const USER_INFO: &str = "user_info";

pub const CONVERSATIONS: &str = "conversations";
pub const CURRENT_CONVERSATION_ID: &str = "currentConversationId";
pub const MESSAGES_PREFIX: &str = "messages_";

pub const MODELS: &str = "models";
pub const PROMPTS: &str = "prompts";
pub const KNOWLEDGE_BASES: &str = "knowledge_bases";
pub const DOCUMENTS_PREFIX: &str = "documents_";
pub const TODOS: &str = "todos";

pub const USER_SETTINGS: &str = "userSettings";
pub const DEFAULT_MODEL_SETTINGS: &str = "defaultModelSettings";
pub const GENERAL_SETTINGS: &str = "generalSettings";
pub const DISPLAY_SETTINGS: &str = "displaySettings";

pub fn messages(conversation_id: i64) -> String {
    format!("{MESSAGES_PREFIX}{conversation_id}")
}

pub fn documents(knowledge_base_id: i64) -> String {
    format!("{DOCUMENTS_PREFIX}{knowledge_base_id}")
}
