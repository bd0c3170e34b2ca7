use std::sync::atomic::{AtomicI64, Ordering};

use futures_util::{Stream, StreamExt};
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::{now_timestamp, rehydrate};
use crate::api::chat_api::{DEFAULT_CONVERSATION_PAGE, DEFAULT_HISTORY_LIMIT};
use crate::api::{chat_events, ChatApi};
use crate::errors::{AppError, AppResult};
use crate::models::chat::{
    ChatRequest, ChatResponse, ChatStreamEvent, Conversation, ConversationCreateRequest, Message,
    MessageRole,
};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct ChatState {
    conversations: Vec<Conversation>,
    current_conversation_id: Option<i64>,
    messages: Vec<Message>,
    is_loading: bool,
    is_streaming: bool,
}

/// Conversation list, the current selection and its messages.
pub struct ChatStore {
    api: ChatApi,
    mirror: Mirror,
    state: RwLock<ChatState>,
    // Ids handed to messages that exist only locally until the server assigns one.
    next_local_id: AtomicI64,
}

impl ChatStore {
    pub fn new(api: ChatApi, mirror: Mirror) -> Self {
        Self {
            api,
            mirror,
            state: RwLock::new(ChatState::default()),
            next_local_id: AtomicI64::new(-1),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.conversations.clone()
    }

    pub async fn current_conversation_id(&self) -> Option<i64> {
        self.state.read().await.current_conversation_id
    }

    pub async fn current_conversation(&self) -> Option<Conversation> {
        let state = self.state.read().await;
        let id = state.current_conversation_id?;
        state.conversations.iter().find(|c| c.id == id).cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn is_streaming(&self) -> bool {
        self.state.read().await.is_streaming
    }

    // ── Local mutations ──────────────────────────────────────────────────────

    pub async fn add_message(&self, message: Message) {
        self.state.write().await.messages.push(message);
    }

    /// Replaces a message's content. Returns `false` if the id is unknown.
    pub async fn update_message(&self, message_id: i64, content: &str) -> bool {
        let mut state = self.state.write().await;
        match state.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.content = content.to_string();
                message.updated_at = now_timestamp();
                true
            }
            None => false,
        }
    }

    /// Appends a streamed chunk to a message's content.
    pub async fn append_message_content(&self, message_id: i64, chunk: &str) -> bool {
        let mut state = self.state.write().await;
        match state.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.content.push_str(chunk);
                message.updated_at = now_timestamp();
                true
            }
            None => false,
        }
    }

    /// Pure assignment: does not load the conversation's messages.
    pub async fn set_current_conversation(&self, conversation_id: Option<i64>) {
        self.state.write().await.current_conversation_id = conversation_id;
    }

    /// Inserts at the front and selects it. The message list is left as is.
    pub async fn add_conversation(&self, conversation: Conversation) {
        let mut state = self.state.write().await;
        state.current_conversation_id = Some(conversation.id);
        state.conversations.insert(0, conversation);
    }

    pub async fn clear_messages(&self) {
        self.state.write().await.messages.clear();
    }

    // ── Server-backed actions ────────────────────────────────────────────────

    pub async fn load_conversations(&self) -> AppResult<Vec<Conversation>> {
        match self.api.get_conversations(0, DEFAULT_CONVERSATION_PAGE).await {
            Ok(conversations) => {
                self.mirror.save(keys::CONVERSATIONS, &conversations);
                self.state.write().await.conversations = conversations.clone();
                Ok(conversations)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, keys::CONVERSATIONS, "conversations", &e) {
                    self.state.write().await.conversations = cached;
                }
                Err(e)
            }
        }
    }

    pub async fn load_conversation_messages(&self, conversation_id: i64) -> AppResult<Vec<Message>> {
        self.state.write().await.is_loading = true;
        let result = self.api.get_message_history(conversation_id, DEFAULT_HISTORY_LIMIT).await;
        let key = keys::messages(conversation_id);

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(history) => {
                self.mirror.save(&key, &history.messages);
                state.messages = history.messages.clone();
                Ok(history.messages)
            }
            Err(e) => {
                if let Some(cached) = rehydrate(&self.mirror, &key, "conversation messages", &e) {
                    state.messages = cached;
                }
                Err(e)
            }
        }
    }

    /// Creates the conversation server-side, fetches the full record and
    /// makes it current.
    pub async fn create_conversation(&self, request: &ConversationCreateRequest) -> AppResult<Conversation> {
        let created = self.api.create_conversation(request).await.map_err(|e| {
            error!("Failed to create conversation: {e}");
            e
        })?;
        let conversation = self.api.get_conversation(created.conversation_id).await.map_err(|e| {
            error!("Failed to fetch created conversation {}: {e}", created.conversation_id);
            e
        })?;

        self.add_conversation(conversation.clone()).await;
        self.mirror_conversations().await;
        Ok(conversation)
    }

    pub async fn update_conversation_title(&self, conversation_id: i64, title: &str) -> AppResult<()> {
        self.api
            .update_conversation_title(conversation_id, title)
            .await
            .map_err(|e| {
                error!("Failed to update conversation title: {e}");
                e
            })?;

        let mut state = self.state.write().await;
        if let Some(conversation) = state.conversations.iter_mut().find(|c| c.id == conversation_id) {
            conversation.title = title.to_string();
            conversation.updated_at = now_timestamp();
            self.mirror.save(keys::CONVERSATIONS, &state.conversations);
        }
        Ok(())
    }

    /// Deleting the current conversation also clears the selection and messages.
    pub async fn delete_conversation(&self, conversation_id: i64) -> AppResult<()> {
        self.api.delete_conversation(conversation_id).await.map_err(|e| {
            error!("Failed to delete conversation: {e}");
            e
        })?;

        let mut state = self.state.write().await;
        state.conversations.retain(|c| c.id != conversation_id);
        if state.current_conversation_id == Some(conversation_id) {
            state.current_conversation_id = None;
            state.messages.clear();
        }
        self.mirror.save(keys::CONVERSATIONS, &state.conversations);
        self.mirror.remove(&keys::messages(conversation_id));
        Ok(())
    }

    /// Non-streaming turn. Both sides of the exchange are appended once the
    /// server has answered.
    pub async fn send_message(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let response = self.api.send_message(request).await.map_err(|e| {
            error!("Failed to send message: {e}");
            e
        })?;

        let now = now_timestamp();
        let user = self.local_message(request.conversation_id, MessageRole::User, &request.message, &now);
        let assistant = Message {
            id: response.message_id,
            token_count: response.token_count,
            message_metadata: response.metadata.clone(),
            ..self.local_message(request.conversation_id, MessageRole::Assistant, &response.message, &now)
        };

        let mut state = self.state.write().await;
        state.messages.push(user);
        state.messages.push(assistant);
        Ok(response)
    }

    /// Streaming turn: appends the user message and an assistant placeholder,
    /// then fills the placeholder as chunks arrive.
    ///
    /// If the request is rejected before streaming starts, both local
    /// messages are removed again. A failure mid-stream is terminal and keeps
    /// whatever content had arrived.
    pub async fn send_message_stream(&self, request: &ChatRequest) -> AppResult<Message> {
        let now = now_timestamp();
        let user = self.local_message(request.conversation_id, MessageRole::User, &request.message, &now);
        let placeholder = self.local_message(request.conversation_id, MessageRole::Assistant, "", &now);
        let (user_id, placeholder_id) = (user.id, placeholder.id);
        {
            let mut state = self.state.write().await;
            state.messages.push(user);
            state.messages.push(placeholder);
        }

        let bytes = match self.api.send_message_stream(request).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to start streaming reply: {e}");
                self.state
                    .write()
                    .await
                    .messages
                    .retain(|m| m.id != user_id && m.id != placeholder_id);
                return Err(e);
            }
        };

        self.consume_stream(placeholder_id, chat_events(bytes)).await
    }

    /// Feeds decoded stream events into the message `message_id`, toggling
    /// `is_streaming` for the duration.
    pub async fn consume_stream<S>(&self, message_id: i64, events: S) -> AppResult<Message>
    where
        S: Stream<Item = AppResult<ChatStreamEvent>> + Send,
    {
        self.state.write().await.is_streaming = true;
        let outcome = self.drain_events(message_id, events).await;
        self.state.write().await.is_streaming = false;
        outcome?;

        self.state
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Message", message_id))
    }

    async fn drain_events<S>(&self, message_id: i64, events: S) -> AppResult<()>
    where
        S: Stream<Item = AppResult<ChatStreamEvent>> + Send,
    {
        futures_util::pin_mut!(events);
        while let Some(event) = events.next().await {
            match event? {
                ChatStreamEvent::Content { content } => {
                    self.append_message_content(message_id, &content).await;
                }
                ChatStreamEvent::Metadata { metadata } => {
                    debug!("Stream metadata for message {message_id}: {metadata}");
                }
                ChatStreamEvent::Error { error } => {
                    error!("Streaming reply failed: {error}");
                    return Err(AppError::Stream { message: error });
                }
                ChatStreamEvent::Done => break,
            }
        }
        Ok(())
    }

    fn local_message(&self, conversation_id: i64, role: MessageRole, content: &str, now: &str) -> Message {
        Message {
            id: self.next_local_id.fetch_sub(1, Ordering::Relaxed),
            conversation_id,
            role,
            content: content.to_string(),
            token_count: 0,
            message_metadata: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    async fn mirror_conversations(&self) {
        let state = self.state.read().await;
        self.mirror.save(keys::CONVERSATIONS, &state.conversations);
    }

    /// Writes the conversation list, the selection and its messages.
    pub async fn save_to_storage(&self) {
        let state = self.state.read().await;
        self.mirror.save(keys::CONVERSATIONS, &state.conversations);
        if let Some(id) = state.current_conversation_id {
            self.mirror.save_raw(keys::CURRENT_CONVERSATION_ID, &id.to_string());
            self.mirror.save(&keys::messages(id), &state.messages);
        }
    }

    /// Rehydrates everything `save_to_storage` wrote. Unparseable entries are
    /// logged and skipped, leaving the in-memory value as it was.
    pub async fn restore_from_storage(&self) {
        let mut state = self.state.write().await;
        if let Some(conversations) = self.mirror.load(keys::CONVERSATIONS) {
            state.conversations = conversations;
        }

        let Some(raw_id) = self.mirror.load_raw(keys::CURRENT_CONVERSATION_ID) else {
            return;
        };
        match raw_id.trim().parse::<i64>() {
            Ok(id) => {
                state.current_conversation_id = Some(id);
                if let Some(messages) = self.mirror.load(&keys::messages(id)) {
                    state.messages = messages;
                }
            }
            Err(e) => error!("Ignoring stored current conversation id '{raw_id}': {e}"),
        }
    }
}
