//! Model Context Protocol session handles as reported by the backend.
//! The client never drives the protocol itself; it only mirrors these records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpSessionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpContextType {
    System,
    User,
    Assistant,
    Tool,
}

impl McpContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpContextType::System => "system",
            McpContextType::User => "user",
            McpContextType::Assistant => "assistant",
            McpContextType::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpSession {
    pub id: i64,
    pub session_id: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub mcp_server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config_id: Option<i64>,
    pub status: McpSessionStatus,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default)]
    pub error_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpSessionCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_config_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpContext {
    pub id: i64,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub context_data: Value,
    pub context_type: McpContextType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_metadata: Option<Value>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRequestPayload {
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponsePayload {
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub context_updated: bool,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpSessionStats {
    pub total_sessions: i64,
    pub active_sessions: i64,
    #[serde(default)]
    pub total_messages: i64,
    #[serde(default)]
    pub total_contexts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_message_duration_ms: Option<f64>,
    #[serde(default)]
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConnectionTest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_config: Option<Value>,
}
