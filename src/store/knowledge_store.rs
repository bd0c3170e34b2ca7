use tokio::sync::RwLock;
use tracing::error;

use super::rehydrate;
use crate::api::KnowledgeApi;
use crate::errors::AppResult;
use crate::models::catalog::{
    CatalogQuery, Document, FileUploadResponse, KnowledgeBase, KnowledgeBaseUpdate,
};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct KnowledgeState {
    knowledge_bases: Vec<KnowledgeBase>,
    current_knowledge_base: Option<KnowledgeBase>,
    /// Documents of the most recently loaded knowledge base.
    documents: Vec<Document>,
    is_loading: bool,
}

pub struct KnowledgeStore {
    api: KnowledgeApi,
    mirror: Mirror,
    state: RwLock<KnowledgeState>,
}

impl KnowledgeStore {
    pub fn new(api: KnowledgeApi, mirror: Mirror) -> Self {
        Self { api, mirror, state: RwLock::new(KnowledgeState::default()) }
    }

    pub async fn knowledge_bases(&self) -> Vec<KnowledgeBase> {
        self.state.read().await.knowledge_bases.clone()
    }

    pub async fn active_knowledge_bases(&self) -> Vec<KnowledgeBase> {
        self.state
            .read()
            .await
            .knowledge_bases
            .iter()
            .filter(|kb| kb.is_active)
            .cloned()
            .collect()
    }

    pub async fn current_knowledge_base(&self) -> Option<KnowledgeBase> {
        self.state.read().await.current_knowledge_base.clone()
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.documents.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// Selects a cached knowledge base by id; `None` or an unknown id clears it.
    pub async fn select_knowledge_base(&self, knowledge_base_id: Option<i64>) {
        let mut state = self.state.write().await;
        let selected = knowledge_base_id
            .and_then(|id| state.knowledge_bases.iter().find(|kb| kb.id == id).cloned());
        state.current_knowledge_base = selected;
    }

    pub async fn load_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>> {
        self.state.write().await.is_loading = true;
        let result = self.api.get_knowledge_bases(&CatalogQuery::default()).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(knowledge_bases) => {
                self.mirror.save(keys::KNOWLEDGE_BASES, &knowledge_bases);
                state.knowledge_bases = knowledge_bases.clone();
                Ok(knowledge_bases)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, keys::KNOWLEDGE_BASES, "knowledge bases", &e) {
                    state.knowledge_bases = cached;
                }
                Err(e)
            }
        }
    }

    pub async fn load_documents(&self, knowledge_base_id: i64) -> AppResult<Vec<Document>> {
        let key = keys::documents(knowledge_base_id);
        match self.api.get_documents(knowledge_base_id).await {
            Ok(documents) => {
                self.mirror.save(&key, &documents);
                self.state.write().await.documents = documents.clone();
                Ok(documents)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, &key, "documents", &e) {
                    self.state.write().await.documents = cached;
                }
                Err(e)
            }
        }
    }

    pub async fn create_knowledge_base(&self, knowledge_base: &KnowledgeBaseUpdate) -> AppResult<KnowledgeBase> {
        let created = self.api.create_knowledge_base(knowledge_base).await.map_err(|e| {
            error!("Failed to create knowledge base: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.knowledge_bases.insert(0, created.clone());
        self.mirror.save(keys::KNOWLEDGE_BASES, &state.knowledge_bases);
        Ok(created)
    }

    pub async fn update_knowledge_base(
        &self,
        knowledge_base_id: i64,
        knowledge_base: &KnowledgeBaseUpdate,
    ) -> AppResult<KnowledgeBase> {
        let updated = self
            .api
            .update_knowledge_base(knowledge_base_id, knowledge_base)
            .await
            .map_err(|e| {
                error!("Failed to update knowledge base {knowledge_base_id}: {e}");
                e
            })?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.knowledge_bases.iter_mut().find(|kb| kb.id == knowledge_base_id) {
            *slot = updated.clone();
        }
        if state.current_knowledge_base.as_ref().is_some_and(|kb| kb.id == knowledge_base_id) {
            state.current_knowledge_base = Some(updated.clone());
        }
        self.mirror.save(keys::KNOWLEDGE_BASES, &state.knowledge_bases);
        Ok(updated)
    }

    pub async fn delete_knowledge_base(&self, knowledge_base_id: i64) -> AppResult<()> {
        self.api.delete_knowledge_base(knowledge_base_id).await.map_err(|e| {
            error!("Failed to delete knowledge base {knowledge_base_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.knowledge_bases.retain(|kb| kb.id != knowledge_base_id);
        if state.current_knowledge_base.as_ref().is_some_and(|kb| kb.id == knowledge_base_id) {
            state.current_knowledge_base = None;
        }
        state.documents.retain(|d| d.knowledge_base_id != knowledge_base_id);
        self.mirror.save(keys::KNOWLEDGE_BASES, &state.knowledge_bases);
        self.mirror.remove(&keys::documents(knowledge_base_id));
        Ok(())
    }

    /// The upload answer is not a full document record, so the base's
    /// document list is reloaded afterwards. A failed reload is only logged.
    pub async fn upload_document(
        &self,
        knowledge_base_id: i64,
        file_name: &str,
        content: Vec<u8>,
    ) -> AppResult<FileUploadResponse> {
        let uploaded = self
            .api
            .upload_document(knowledge_base_id, file_name, content)
            .await
            .map_err(|e| {
                error!("Failed to upload '{file_name}': {e}");
                e
            })?;

        if let Err(e) = self.load_documents(knowledge_base_id).await {
            error!("Uploaded '{file_name}' but could not refresh documents: {e}");
        }
        Ok(uploaded)
    }

    pub async fn delete_document(&self, knowledge_base_id: i64, document_id: i64) -> AppResult<()> {
        self.api
            .delete_document(knowledge_base_id, document_id)
            .await
            .map_err(|e| {
                error!("Failed to delete document {document_id}: {e}");
                e
            })?;

        let mut state = self.state.write().await;
        state.documents.retain(|d| d.id != document_id);
        let remaining: Vec<&Document> = state
            .documents
            .iter()
            .filter(|d| d.knowledge_base_id == knowledge_base_id)
            .collect();
        self.mirror.save(&keys::documents(knowledge_base_id), &remaining);
        Ok(())
    }
}
