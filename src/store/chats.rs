//! Chat list and per-chat message history.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use super::{AsyncState, LoadStatus};
use crate::api::cursor::MAX_PAGE_SIZE;
use crate::api::{ApiClient, ApiResult, ChatQuery, NewChat, PageRequest};
use crate::models::{ChatMessage, ChatSummary, Role};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatsState {
    pub list: AsyncState<Vec<ChatSummary>>,
    /// Cursor for the page after the last one loaded into `list`
    pub next_cursor: Option<String>,
    pub search_query: String,
    pub active_id: Option<String>,
    pub messages: HashMap<String, AsyncState<Vec<ChatMessage>>>,
    /// Sends in flight
    pub sending: usize,
}

impl ChatsState {
    pub fn is_sending(&self) -> bool {
        self.sending > 0
    }

    pub fn messages_for(&self, chat_id: &str) -> Option<&[ChatMessage]> {
        self.messages.get(chat_id)?.data.as_deref()
    }
}

pub struct ChatsSlice {
    api: Arc<dyn ApiClient>,
    state: watch::Sender<ChatsState>,
    /// Query behind the current `list`, reused by `load_more_chats`
    query: Mutex<ChatQuery>,
    send_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatsSlice {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        let (state, _) = watch::channel(ChatsState::default());
        Self {
            api,
            state,
            query: Mutex::new(ChatQuery::default()),
            send_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatsState {
        self.state.borrow().clone()
    }

    pub fn set_search_query(&self, query: &str) {
        self.state
            .send_modify(|s| s.search_query = query.to_string());
    }

    pub fn set_active_chat(&self, chat_id: Option<&str>) {
        self.state
            .send_modify(|s| s.active_id = chat_id.map(String::from));
    }

    /// Replace the list with the first page matching `query`.
    pub async fn load_chats(&self, query: ChatQuery) {
        *lock(&self.query) = query.clone();
        self.state.send_modify(|s| s.list.begin());

        let result = self.api.chats(&query).await;
        self.state.send_modify(|s| match result {
            Ok(page) => {
                tracing::debug!("Loaded {} chats (more: {})", page.items.len(), page.has_more());
                s.next_cursor = page.next_cursor;
                s.list.succeed(page.items);
            }
            Err(e) => {
                tracing::debug!("Loading chats failed: {}", e);
                s.next_cursor = None;
                s.list.fail(e);
            }
        });
    }

    /// Append the next page of the last query. No-op on the last page.
    pub async fn load_more_chats(&self) {
        let Some(cursor) = self.state.borrow().next_cursor.clone() else {
            tracing::debug!("No more chats to load");
            return;
        };

        let mut query = lock(&self.query).clone();
        query.page.cursor = Some(cursor);
        self.state.send_modify(|s| s.list.begin());

        let result = self.api.chats(&query).await;
        self.state.send_modify(|s| match result {
            Ok(page) => {
                let mut items = s.list.data.take().unwrap_or_default();
                items.extend(page.items);
                s.next_cursor = page.next_cursor;
                s.list.succeed(items);
            }
            Err(e) => {
                tracing::debug!("Loading more chats failed: {}", e);
                s.next_cursor = None;
                s.list.fail(e);
            }
        });
    }

    /// Load the full history of one chat.
    pub async fn load_messages(&self, chat_id: &str) {
        self.state
            .send_modify(|s| s.messages.entry(chat_id.to_string()).or_default().begin());

        let result = self.fetch_history(chat_id).await;
        if let Err(ref e) = result {
            tracing::debug!("Loading messages for {} failed: {}", chat_id, e);
        }
        self.state.send_modify(|s| {
            s.messages
                .entry(chat_id.to_string())
                .or_default()
                .settle(result)
        });
    }

    async fn fetch_history(&self, chat_id: &str) -> ApiResult<Vec<ChatMessage>> {
        let mut messages = Vec::new();
        let mut page = PageRequest::first(MAX_PAGE_SIZE);
        loop {
            let resp = self.api.chat_messages(chat_id, &page).await?;
            messages.extend(resp.items);
            match resp.next_cursor {
                Some(next) => page.cursor = Some(next),
                None => return Ok(messages),
            }
        }
    }

    /// Send `content` and return the assistant reply.
    ///
    /// The user message is shown immediately and removed again if the send
    /// fails. Sends to the same chat run one at a time.
    pub async fn send_chat_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage> {
        let chat_lock = self.send_lock(chat_id);
        let _guard = chat_lock.lock().await;

        let local = ChatMessage {
            id: format!("local_{}", Uuid::new_v4().simple()),
            chat_id: chat_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let local_id = local.id.clone();

        let mut previous = None;
        self.state.send_modify(|s| {
            s.sending += 1;
            previous = s.messages.get(chat_id).cloned();
            let history = s.messages.entry(chat_id.to_string()).or_default();
            let mut items = history.data.take().unwrap_or_default();
            items.push(local);
            history.succeed(items);
        });

        let reply = match self.api.send_message(chat_id, content).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Send to {} failed, rolling back: {}", chat_id, e);
                self.state.send_modify(|s| {
                    s.sending = s.sending.saturating_sub(1);
                    restore_history(&mut s.messages, chat_id, previous, &local_id);
                });
                return Err(e);
            }
        };

        self.state.send_modify(|s| {
            s.sending = s.sending.saturating_sub(1);
            let history = s.messages.entry(chat_id.to_string()).or_default();
            let mut items = history.data.take().unwrap_or_default();
            items.push(reply.clone());
            history.succeed(items);
        });

        self.refresh_list().await;
        Ok(reply)
    }

    /// Reload the first page of the current query so summaries pick up a send.
    async fn refresh_list(&self) {
        let mut query = lock(&self.query).clone();
        query.page.cursor = None;

        match self.api.chats(&query).await {
            Ok(page) => self.state.send_modify(|s| {
                s.next_cursor = page.next_cursor;
                s.list.succeed(page.items);
            }),
            Err(e) => tracing::warn!("Chat list refresh failed: {}", e),
        }
    }

    /// Create a chat, put it at the top of the list and return its id.
    pub async fn create_new_chat(&self, title: Option<&str>) -> ApiResult<String> {
        let request = NewChat {
            title: title.map(String::from),
        };
        let chat = self.api.create_chat(&request).await?;
        let id = chat.id.clone();

        self.state.send_modify(|s| {
            s.list.data.get_or_insert_with(Vec::new).insert(0, chat);
            let mut history = AsyncState::default();
            history.succeed(Vec::new());
            s.messages.insert(id.clone(), history);
        });
        tracing::debug!("Created chat {}", id);
        Ok(id)
    }

    fn send_lock(&self, chat_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        lock(&self.send_locks)
            .entry(chat_id.to_string())
            .or_default()
            .clone()
    }
}

/// Undo an optimistic append.
///
/// An entry that was not loaded goes back to its old state, or away if it did
/// not exist. A loaded one only loses the local message.
fn restore_history(
    messages: &mut HashMap<String, AsyncState<Vec<ChatMessage>>>,
    chat_id: &str,
    previous: Option<AsyncState<Vec<ChatMessage>>>,
    local_id: &str,
) {
    match previous {
        Some(prev) if prev.status == LoadStatus::Success => {
            let history = messages.entry(chat_id.to_string()).or_insert(prev);
            if let Some(items) = history.data.as_mut() {
                items.retain(|m| m.id != local_id);
            }
        }
        Some(prev) => {
            messages.insert(chat_id.to_string(), prev);
        }
        None => {
            messages.remove(chat_id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
