use serde::Serialize;
use serde_json::Value;

use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::mcp::{
    McpConnectionTest, McpContext, McpContextType, McpRequestPayload, McpResponsePayload,
    McpSession, McpSessionCreateRequest, McpSessionStats,
};

pub const DEFAULT_CONTEXT_LIMIT: u32 = 50;

#[derive(Serialize)]
struct SessionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
}

#[derive(Serialize)]
struct ContextFilter {
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_type: Option<&'static str>,
}

/// Server-tracked MCP session handles. No protocol state lives client-side.
#[derive(Clone)]
pub struct McpApi {
    http: HttpClient,
}

impl McpApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create_session(&self, request: &McpSessionCreateRequest) -> AppResult<McpSession> {
        self.http.post("/mcp/sessions", request).await
    }

    pub async fn get_sessions(&self, is_active: Option<bool>) -> AppResult<Vec<McpSession>> {
        self.http
            .get_with_query("/mcp/sessions", &SessionFilter { is_active })
            .await
    }

    pub async fn get_session(&self, session_id: &str) -> AppResult<McpSession> {
        self.http.get(&format!("/mcp/sessions/{session_id}")).await
    }

    pub async fn send_request(
        &self,
        session_id: &str,
        request: &McpRequestPayload,
    ) -> AppResult<McpResponsePayload> {
        self.http
            .post(&format!("/mcp/sessions/{session_id}/request"), request)
            .await
    }

    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        let _: Value = self.http.delete(&format!("/mcp/sessions/{session_id}")).await?;
        Ok(())
    }

    pub async fn get_session_contexts(
        &self,
        session_id: &str,
        context_type: Option<McpContextType>,
        limit: u32,
    ) -> AppResult<Vec<McpContext>> {
        let filter = ContextFilter { limit, context_type: context_type.map(|t| t.as_str()) };
        self.http
            .get_with_query(&format!("/mcp/sessions/{session_id}/contexts"), &filter)
            .await
    }

    pub async fn health_check(&self) -> AppResult<Value> {
        self.http.get("/mcp/health").await
    }

    pub async fn get_session_stats(&self) -> AppResult<McpSessionStats> {
        self.http.get("/mcp/stats").await
    }

    pub async fn test_connection(&self, test: &McpConnectionTest) -> AppResult<Value> {
        self.http.post("/mcp/test-connection", test).await
    }
}
