use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::catalog::{
    CatalogQuery, Document, FileUploadResponse, KnowledgeBase, KnowledgeBaseStats,
    KnowledgeBaseUpdate,
};
use crate::models::MessageResponse;

pub const DEFAULT_SEARCH_TOP_K: u32 = 5;

/// Knowledge bases and the documents indexed into them.
#[derive(Clone)]
pub struct KnowledgeApi {
    http: HttpClient,
}

impl KnowledgeApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get_knowledge_bases(&self, query: &CatalogQuery) -> AppResult<Vec<KnowledgeBase>> {
        self.http.get_with_query("/knowledge-bases", query).await
    }

    pub async fn get_active_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>> {
        self.http.get("/knowledge-bases/active").await
    }

    pub async fn get_knowledge_base(&self, knowledge_base_id: i64) -> AppResult<KnowledgeBase> {
        self.http.get(&format!("/knowledge-bases/{knowledge_base_id}")).await
    }

    pub async fn create_knowledge_base(&self, knowledge_base: &KnowledgeBaseUpdate) -> AppResult<KnowledgeBase> {
        self.http.post("/knowledge-bases", knowledge_base).await
    }

    pub async fn update_knowledge_base(
        &self,
        knowledge_base_id: i64,
        knowledge_base: &KnowledgeBaseUpdate,
    ) -> AppResult<KnowledgeBase> {
        self.http
            .put(&format!("/knowledge-bases/{knowledge_base_id}"), knowledge_base)
            .await
    }

    pub async fn delete_knowledge_base(&self, knowledge_base_id: i64) -> AppResult<MessageResponse> {
        self.http.delete(&format!("/knowledge-bases/{knowledge_base_id}")).await
    }

    pub async fn get_documents(&self, knowledge_base_id: i64) -> AppResult<Vec<Document>> {
        self.http
            .get(&format!("/knowledge-bases/{knowledge_base_id}/documents"))
            .await
    }

    /// Uploads a file as the multipart field `file`.
    pub async fn upload_document(
        &self,
        knowledge_base_id: i64,
        file_name: &str,
        content: Vec<u8>,
    ) -> AppResult<FileUploadResponse> {
        let form = Form::new().part("file", Part::bytes(content).file_name(file_name.to_string()));
        self.http
            .post_multipart(&format!("/knowledge-bases/{knowledge_base_id}/documents"), form)
            .await
    }

    pub async fn delete_document(&self, knowledge_base_id: i64, document_id: i64) -> AppResult<MessageResponse> {
        self.http
            .delete(&format!("/knowledge-bases/{knowledge_base_id}/documents/{document_id}"))
            .await
    }

    pub async fn get_stats(&self, knowledge_base_id: i64) -> AppResult<KnowledgeBaseStats> {
        self.http
            .get(&format!("/knowledge-bases/{knowledge_base_id}/stats"))
            .await
    }

    pub async fn search(&self, knowledge_base_id: i64, query: &str, top_k: u32) -> AppResult<Value> {
        let form = Form::new()
            .text("query", query.to_string())
            .text("top_k", top_k.to_string());
        self.http
            .post_multipart(&format!("/knowledge-bases/{knowledge_base_id}/search"), form)
            .await
    }
}
