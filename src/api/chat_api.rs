use std::collections::VecDeque;

use futures_util::{stream, Stream, StreamExt};
use serde_json::Value;

use super::client::{ByteStream, HttpClient};
use crate::errors::AppResult;
use crate::models::chat::{
    ChatRequest, ChatResponse, ChatStreamEvent, Conversation, ConversationCreateRequest,
    ConversationCreateResponse, MessageHistoryResponse, RagChatRequest, RagChatResponse,
    UpdatePromptTemplateRequest, UpdateTitleRequest,
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_CONVERSATION_PAGE: u32 = 20;

/// Conversations, messages and chat turns.
#[derive(Clone)]
pub struct ChatApi {
    http: HttpClient,
}

impl ChatApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn send_message(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.http.post("/chat/send", request).await
    }

    /// Raw incremental body of `/chat/stream`. Pair with [`chat_events`] to decode.
    pub async fn send_message_stream(&self, request: &ChatRequest) -> AppResult<ByteStream> {
        self.http.post_stream("/chat/stream", request).await
    }

    pub async fn create_conversation(
        &self,
        request: &ConversationCreateRequest,
    ) -> AppResult<ConversationCreateResponse> {
        self.http.post("/chat/conversations", request).await
    }

    pub async fn get_message_history(
        &self,
        conversation_id: i64,
        limit: u32,
    ) -> AppResult<MessageHistoryResponse> {
        self.http
            .get_with_query(
                &format!("/chat/conversations/{conversation_id}/messages"),
                &[("limit", limit)],
            )
            .await
    }

    pub async fn chat_with_rag(&self, request: &RagChatRequest) -> AppResult<RagChatResponse> {
        self.http.post("/chat/rag", request).await
    }

    pub async fn get_conversation_summary(&self, conversation_id: i64) -> AppResult<Value> {
        self.http
            .get(&format!("/chat/conversations/{conversation_id}/summary"))
            .await
    }

    pub async fn get_conversations(&self, skip: u32, limit: u32) -> AppResult<Vec<Conversation>> {
        self.http
            .get_with_query("/conversations", &[("skip", skip), ("limit", limit)])
            .await
    }

    pub async fn get_conversation(&self, conversation_id: i64) -> AppResult<Conversation> {
        self.http.get(&format!("/conversations/{conversation_id}")).await
    }

    pub async fn update_conversation_title(
        &self,
        conversation_id: i64,
        title: &str,
    ) -> AppResult<Value> {
        let body = UpdateTitleRequest { title: title.to_string() };
        self.http
            .put(&format!("/conversations/{conversation_id}/title"), &body)
            .await
    }

    pub async fn delete_conversation(&self, conversation_id: i64) -> AppResult<Value> {
        self.http.delete(&format!("/conversations/{conversation_id}")).await
    }

    pub async fn update_conversation_prompt_template(
        &self,
        conversation_id: i64,
        prompt_template_id: i64,
    ) -> AppResult<Value> {
        let body = UpdatePromptTemplateRequest { prompt_template_id };
        self.http
            .put(&format!("/conversations/{conversation_id}/prompt-template"), &body)
            .await
    }
}

/// Splits a chat byte stream into newline-delimited frames.
///
/// A line with an SSE `data:` prefix, or one that parses as a JSON
/// [`ChatStreamEvent`], is a structured frame. Once a `data:` frame has been
/// seen, blank lines and SSE control lines are dropped. Any other line is
/// plain text and is passed through verbatim, newline included.
#[derive(Debug, Default)]
pub struct ChatStreamDecoder {
    buffer: Vec<u8>,
    sse: bool,
}

impl ChatStreamDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing frame that was not newline-terminated.
    pub fn finish(&mut self) -> Option<ChatStreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.is_empty() {
            return None;
        }
        self.parse_line(&String::from_utf8_lossy(&rest))
    }

    fn parse_line(&mut self, line: &str) -> Option<ChatStreamEvent> {
        let trimmed = line.trim();

        if let Some(payload) = trimmed.strip_prefix("data:") {
            self.sse = true;
            let payload = payload.trim();
            return match payload {
                "" => None,
                "[DONE]" => Some(ChatStreamEvent::Done),
                _ => Some(
                    serde_json::from_str(payload)
                        .unwrap_or_else(|_| ChatStreamEvent::Content { content: payload.to_string() }),
                ),
            };
        }

        if trimmed.starts_with('{') {
            if let Ok(event) = serde_json::from_str(trimmed) {
                return Some(event);
            }
        }

        if self.sse && is_sse_filler(trimmed) {
            return None;
        }
        Some(ChatStreamEvent::Content { content: line.to_string() })
    }
}

fn is_sse_filler(line: &str) -> bool {
    line.is_empty()
        || line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:")
}

/// Decodes a raw chat byte stream into events. A transport failure is
/// yielded once and ends the stream; there is no resume.
pub fn chat_events(bytes: ByteStream) -> impl Stream<Item = AppResult<ChatStreamEvent>> + Send {
    let state = (bytes, ChatStreamDecoder::default(), VecDeque::new(), false);
    stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut finished)| async move {
        loop {
            if let Some(event) = pending.pop_front() {
                return Some((Ok(event), (bytes, decoder, pending, finished)));
            }
            if finished {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                Some(Err(e)) => {
                    finished = true;
                    return Some((Err(e), (bytes, decoder, pending, finished)));
                }
                None => {
                    finished = true;
                    pending.extend(decoder.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn decoder_handles_frames_split_across_chunks() {
        let mut decoder = ChatStreamDecoder::default();
        assert!(decoder.push(br#"data: {"type":"content","con"#).is_empty());
        let events = decoder.push(b"tent\":\"Hi\"}\n\ndata: [DONE]\n");
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Content { content: "Hi".to_string() },
                ChatStreamEvent::Done,
            ]
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn plain_text_frames_become_content() {
        let mut decoder = ChatStreamDecoder::default();
        assert!(decoder.push(b"partial answer").is_empty());
        assert_eq!(
            decoder.finish(),
            Some(ChatStreamEvent::Content { content: "partial answer".to_string() })
        );
    }

    #[test]
    fn plain_text_keeps_line_breaks_and_indentation() {
        let text = "line one\n\n    indented code\nend";
        let mut decoder = ChatStreamDecoder::default();
        let mut events = decoder.push(&text.as_bytes()[..12]);
        events.extend(decoder.push(&text.as_bytes()[12..]));
        events.extend(decoder.finish());

        let rebuilt: String = events
            .into_iter()
            .map(|event| match event {
                ChatStreamEvent::Content { content } => content,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn sse_filler_lines_are_dropped() {
        let mut decoder = ChatStreamDecoder::default();
        let events = decoder.push(b"data: hello\n\n: keep-alive\nevent: message\ndata: [DONE]\n");
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Content { content: "hello".to_string() },
                ChatStreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_terminates_event_stream() {
        let chunks: Vec<AppResult<Vec<u8>>> = vec![
            Ok(b"{\"type\":\"content\",\"content\":\"a\"}\n".to_vec()),
            Err(AppError::Stream { message: "reset".to_string() }),
            Ok(b"{\"type\":\"content\",\"content\":\"never\"}\n".to_vec()),
        ];
        let bytes: ByteStream = Box::pin(stream::iter(chunks));
        let events: Vec<_> = chat_events(bytes).collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(ChatStreamEvent::Content { .. })));
        assert!(matches!(events[1], Err(AppError::Stream { .. })));
    }
}
