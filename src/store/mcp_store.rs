use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::api::mcp_api::DEFAULT_CONTEXT_LIMIT;
use crate::api::McpApi;
use crate::errors::AppResult;
use crate::models::mcp::{
    McpConnectionTest, McpContext, McpContextType, McpRequestPayload, McpResponsePayload,
    McpSession, McpSessionCreateRequest, McpSessionStats, McpSessionStatus,
};

#[derive(Debug, Default)]
struct McpState {
    sessions: Vec<McpSession>,
    stats: Option<McpSessionStats>,
    is_loading: bool,
}

/// MCP session handles. Their status changes server-side at any time, so
/// nothing here is mirrored to durable storage.
pub struct McpStore {
    api: McpApi,
    state: RwLock<McpState>,
}

impl McpStore {
    pub fn new(api: McpApi) -> Self {
        Self { api, state: RwLock::new(McpState::default()) }
    }

    pub async fn sessions(&self) -> Vec<McpSession> {
        self.state.read().await.sessions.clone()
    }

    pub async fn stats(&self) -> Option<McpSessionStats> {
        self.state.read().await.stats.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn active_sessions(&self) -> Vec<McpSession> {
        self.state
            .read()
            .await
            .sessions
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect()
    }

    pub async fn connected_sessions(&self) -> Vec<McpSession> {
        self.state
            .read()
            .await
            .sessions
            .iter()
            .filter(|s| s.status == McpSessionStatus::Connected)
            .cloned()
            .collect()
    }

    pub async fn load_sessions(&self, is_active: Option<bool>) -> AppResult<Vec<McpSession>> {
        self.state.write().await.is_loading = true;
        let result = self.api.get_sessions(is_active).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        let sessions = result.map_err(|e| {
            error!("Failed to load MCP sessions: {e}");
            e
        })?;
        state.sessions = sessions.clone();
        Ok(sessions)
    }

    pub async fn create_session(&self, request: &McpSessionCreateRequest) -> AppResult<McpSession> {
        let session = self.api.create_session(request).await.map_err(|e| {
            error!("Failed to create MCP session: {e}");
            e
        })?;
        self.state.write().await.sessions.insert(0, session.clone());
        Ok(session)
    }

    /// Replaces the cached session with the server's current view of it.
    pub async fn refresh_session(&self, session_id: &str) -> AppResult<McpSession> {
        let session = self.api.get_session(session_id).await.map_err(|e| {
            error!("Failed to refresh MCP session {session_id}: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        match state.sessions.iter_mut().find(|s| s.session_id == session_id) {
            Some(slot) => *slot = session.clone(),
            None => state.sessions.insert(0, session.clone()),
        }
        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        self.api.delete_session(session_id).await.map_err(|e| {
            error!("Failed to delete MCP session {session_id}: {e}");
            e
        })?;
        self.state.write().await.sessions.retain(|s| s.session_id != session_id);
        Ok(())
    }

    /// Sending a request bumps the session's counters server-side, so the
    /// cached copy is refreshed afterwards. A failed refresh is only logged.
    pub async fn send_request(
        &self,
        session_id: &str,
        request: &McpRequestPayload,
    ) -> AppResult<McpResponsePayload> {
        let response = self.api.send_request(session_id, request).await.map_err(|e| {
            error!("MCP request on session {session_id} failed: {e}");
            e
        })?;

        if let Err(e) = self.refresh_session(session_id).await {
            warn!("Could not refresh MCP session {session_id} after request: {e}");
        }
        Ok(response)
    }

    pub async fn load_contexts(
        &self,
        session_id: &str,
        context_type: Option<McpContextType>,
        limit: Option<u32>,
    ) -> AppResult<Vec<McpContext>> {
        self.api
            .get_session_contexts(session_id, context_type, limit.unwrap_or(DEFAULT_CONTEXT_LIMIT))
            .await
            .map_err(|e| {
                error!("Failed to load contexts for MCP session {session_id}: {e}");
                e
            })
    }

    pub async fn load_stats(&self) -> AppResult<McpSessionStats> {
        let stats = self.api.get_session_stats().await.map_err(|e| {
            error!("Failed to load MCP stats: {e}");
            e
        })?;
        self.state.write().await.stats = Some(stats.clone());
        Ok(stats)
    }

    pub async fn health_check(&self) -> AppResult<Value> {
        self.api.health_check().await.map_err(|e| {
            error!("MCP health check failed: {e}");
            e
        })
    }

    pub async fn test_connection(&self, test: &McpConnectionTest) -> AppResult<Value> {
        self.api.test_connection(test).await.map_err(|e| {
            error!("MCP connection test failed: {e}");
            e
        })
    }
}
