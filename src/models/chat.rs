use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub model_config_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template_id: Option<i64>,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_metadata: Option<Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Per-request generation overrides sent along with a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: i64,
    pub message: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_config_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_settings: Option<ModelSettings>,
}

impl ChatRequest {
    pub fn new(conversation_id: i64, message: impl Into<String>, stream: bool) -> Self {
        Self {
            conversation_id,
            message: message.into(),
            stream,
            model_config_id: None,
            knowledge_base_id: None,
            prompt_template_id: None,
            model_settings: None,
        }
    }
}

/// Non-streaming reply. The assistant text is in `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    pub message_id: i64,
    pub message: String,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_exceeded: Option<bool>,
}

/// One decoded frame of the streaming chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    Content {
        #[serde(default)]
        content: String,
    },
    Metadata {
        #[serde(default)]
        metadata: Value,
    },
    Error {
        #[serde(default)]
        error: String,
    },
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationCreateRequest {
    pub title: String,
    pub model_config_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationCreateResponse {
    pub conversation_id: i64,
    pub title: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHistoryResponse {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub total_count: i64,
    pub conversation_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChatRequest {
    pub conversation_id: i64,
    pub message: String,
    pub knowledge_base_id: i64,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChatResponse {
    pub message_id: i64,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<RagSource>,
    #[serde(default)]
    pub token_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePromptTemplateRequest {
    pub prompt_template_id: i64,
}
