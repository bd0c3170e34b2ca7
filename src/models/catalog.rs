//! Independently owned catalog entities: model configs, prompt templates,
//! knowledge bases and their documents.

use serde::{Deserialize, Serialize};

use super::string_or_number;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: i64,
    pub name: String,
    pub provider: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub temperature: String,
    #[serde(default)]
    pub max_tokens: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Partial model config used by both create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelListQuery {
    pub skip: u32,
    pub limit: u32,
    pub active_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ModelListQuery {
    pub fn new() -> Self {
        Self { skip: 0, limit: 100, active_only: true, provider: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: i64,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// `skip`/`limit`/`active_only` paging shared by prompt and knowledge base listings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogQuery {
    pub skip: u32,
    pub limit: u32,
    pub active_only: bool,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self { skip: 0, limit: 100, active_only: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default)]
    pub chunk_size: i64,
    #[serde(default)]
    pub chunk_overlap: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub document_count: i64,
    #[serde(default)]
    pub total_chunks: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub knowledge_base_id: i64,
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub processing_status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub document_id: i64,
    pub filename: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub processing_status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    pub total_documents: i64,
    pub total_chunks: i64,
    #[serde(default)]
    pub total_size: i64,
    #[serde(default)]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_accepts_number_or_string() {
        let numeric: ModelConfig = serde_json::from_str(
            r#"{"id":1,"name":"gpt","provider":"openai","model_name":"gpt-4o","temperature":0.7}"#,
        )
        .unwrap();
        assert_eq!(numeric.temperature, "0.7");

        let text: ModelConfig = serde_json::from_str(
            r#"{"id":1,"name":"gpt","provider":"openai","model_name":"gpt-4o","temperature":"0.2"}"#,
        )
        .unwrap();
        assert_eq!(text.temperature, "0.2");
    }

    #[test]
    fn partial_update_omits_unset_fields() {
        let update = ModelConfigUpdate { is_active: Some(false), ..Default::default() };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"is_active":false}"#);
    }
}
