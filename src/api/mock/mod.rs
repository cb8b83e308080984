//! Mock backend operating on an in-memory [`FixtureStore`]
//!
//! Implements the same validation, ordering and pagination a real backend
//! must honor. Latency and failure injection live in
//! [`crate::api::simulate::Simulated`], not here.

mod fixtures;
mod store;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

pub use store::{FixtureStore, InMemoryStore};

use super::cursor;
use super::{ApiClient, ApiError, ApiResult, ChatQuery, NewChat, PageRequest};
use crate::models::{
    ChatMessage, ChatSummary, FileItem, FolderList, Page, Role, UploadFile, UploadResponse, User,
    MAX_MESSAGE_CHARS,
};

/// Largest accepted upload (15 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;

/// MIME types accepted by `upload_file`.
pub const ALLOWED_MIME_TYPES: [&str; 6] = [
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/gif",
    "text/plain",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Title given to chats created without one.
pub const DEFAULT_CHAT_TITLE: &str = "New conversation";

pub const MAX_TITLE_CHARS: usize = 200;

/// How much of the prompt the canned assistant reply quotes.
const REPLY_QUOTE_CHARS: usize = 50;

/// [`ApiClient`] answering from a [`FixtureStore`].
pub struct MockClient {
    store: Arc<dyn FixtureStore>,
}

impl MockClient {
    pub fn new(store: Arc<dyn FixtureStore>) -> Self {
        Self { store }
    }

    fn new_id(prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4().simple())
    }
}

/// Canned assistant answer quoting the start of the prompt.
fn simulated_reply(prompt: &str) -> String {
    let quoted: String = prompt.chars().take(REPLY_QUOTE_CHARS).collect();
    format!("This is a simulated reply to: \"{}...\"", quoted)
}

#[async_trait]
impl ApiClient for MockClient {
    async fn current_user(&self) -> ApiResult<User> {
        Ok(self.store.current_user())
    }

    async fn chats(&self, query: &ChatQuery) -> ApiResult<Page<ChatSummary>> {
        let mut chats = self.store.list_chats();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            chats.retain(|chat| {
                chat.title.to_lowercase().contains(&needle)
                    || chat
                        .last_message
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(&needle))
            });
        }

        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        tracing::debug!("Mock chats: {} match", chats.len());

        Ok(cursor::paginate(
            chats,
            query.page.cursor.as_deref(),
            query.page.limit,
        ))
    }

    async fn create_chat(&self, request: &NewChat) -> ApiResult<ChatSummary> {
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CHAT_TITLE);

        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApiError::validation(format!(
                "Title exceeds {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let now = Utc::now();
        let chat = ChatSummary {
            id: Self::new_id("chat"),
            title: title.to_string(),
            last_message: None,
            message_count: 0,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!("Mock created chat {}", chat.id);
        self.store.insert_chat(chat.clone());
        Ok(chat)
    }

    async fn chat_messages(
        &self,
        chat_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<ChatMessage>> {
        let mut messages = self
            .store
            .list_messages(chat_id)
            .ok_or_else(|| ApiError::not_found(format!("Chat {} not found", chat_id)))?;

        messages.sort_by_key(|m| m.created_at);
        Ok(cursor::paginate(
            messages,
            page.cursor.as_deref(),
            page.limit,
        ))
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage> {
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::validation(format!(
                "Message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        if self.store.get_chat(chat_id).is_none() {
            return Err(ApiError::not_found(format!("Chat {} not found", chat_id)));
        }

        let exchange = Uuid::new_v4().simple().to_string();
        let user_message = ChatMessage {
            id: format!("msg_{}_{}_user", chat_id, exchange),
            chat_id: chat_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let reply = ChatMessage {
            id: format!("msg_{}_{}_assistant", chat_id, exchange),
            chat_id: chat_id.to_string(),
            role: Role::Assistant,
            content: simulated_reply(content),
            created_at: Utc::now(),
        };

        let count = self
            .store
            .append_messages(chat_id, vec![user_message, reply.clone()])
            .ok_or_else(|| ApiError::not_found(format!("Chat {} not found", chat_id)))?;

        self.store.update_chat(chat_id, &mut |chat| {
            chat.last_message = Some(reply.content.clone());
            chat.message_count = count;
            chat.updated_at = reply.created_at;
        });

        tracing::debug!("Mock reply in {} ({} messages)", chat_id, count);
        Ok(reply)
    }

    async fn folders(&self) -> ApiResult<FolderList> {
        Ok(FolderList {
            items: self.store.list_folders(),
        })
    }

    async fn folder_files(
        &self,
        folder_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<FileItem>> {
        let mut files = self
            .store
            .list_files(folder_id)
            .ok_or_else(|| ApiError::not_found(format!("Folder {} not found", folder_id)))?;

        files.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(cursor::paginate(files, page.cursor.as_deref(), page.limit))
    }

    async fn upload_file(&self, folder_id: &str, file: &UploadFile) -> ApiResult<UploadResponse> {
        let folder = self
            .store
            .get_folder(folder_id)
            .ok_or_else(|| ApiError::not_found(format!("Folder {} not found", folder_id)))?;

        if !folder.can_upload {
            return Err(ApiError::forbidden(format!(
                "No upload permission for folder {}",
                folder_id
            )));
        }

        if file.size() > MAX_UPLOAD_BYTES {
            return Err(ApiError::validation("File size exceeds 15MB limit")
                .with_detail("size", file.size())
                .with_detail("maxSize", MAX_UPLOAD_BYTES));
        }

        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(ApiError::validation(format!(
                "File type {} not allowed",
                file.mime_type
            )));
        }

        let now = Utc::now();
        let item = FileItem {
            id: Self::new_id(&format!("file_{}", folder_id)),
            folder_id: folder_id.to_string(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size(),
            uploaded_by: self.store.current_user().name,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!("Mock stored {} in {}", item.name, folder_id);
        self.store.insert_file(item.clone());
        Ok(UploadResponse {
            success: true,
            file: item,
        })
    }

    async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        self.store
            .remove_file(file_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("File {} not found", file_id)))
    }

    async fn download_file(&self, file_id: &str) -> ApiResult<Vec<u8>> {
        let file = self
            .store
            .get_file(file_id)
            .ok_or_else(|| ApiError::not_found(format!("File {} not found", file_id)))?;
        Ok(format!("Mock contents of {} ({} bytes)\n", file.name, file.size).into_bytes())
    }
}
