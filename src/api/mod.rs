//! API layer for the document assistant
//!
//! One [`ApiClient`] interface with two implementations: the in-memory
//! [`mock::MockClient`] (normally wrapped in [`simulate::Simulated`]) and the
//! HTTP-backed [`real::RealClient`]. [`connect`] picks one from the config.

pub mod cursor;
pub mod error;
pub mod http;
pub mod mock;
pub mod real;
pub mod simulate;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::models::{
    ChatMessage, ChatSummary, FileItem, FolderList, Page, UploadFile, UploadResponse, User,
};

pub use error::{ApiError, ApiResult, ErrorCode};

/// Query for `GET /chats`
#[derive(Debug, Clone, Default)]
pub struct ChatQuery {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl ChatQuery {
    /// Query-string pairs, skipping unset fields.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.page.query_pairs();
        if let Some(ref search) = self.search {
            pairs.insert(0, ("search", search.clone()));
        }
        pairs
    }
}

/// Pagination parameters shared by every listing endpoint
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn new(limit: Option<usize>, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// First page with the given size.
    pub fn first(limit: usize) -> Self {
        Self::new(Some(limit), None)
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(ref cursor) = self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        pairs
    }
}

/// Body of `POST /chats`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewChat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Backend contract used by the state slices.
///
/// Every method mirrors one REST endpoint; see the implementations for the
/// exact validation order each endpoint applies.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET /me`
    async fn current_user(&self) -> ApiResult<User>;

    /// `GET /chats?search&limit&cursor`, newest first
    async fn chats(&self, query: &ChatQuery) -> ApiResult<Page<ChatSummary>>;

    /// `POST /chats`
    async fn create_chat(&self, request: &NewChat) -> ApiResult<ChatSummary>;

    /// `GET /chats/:id/messages`, oldest first
    async fn chat_messages(
        &self,
        chat_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<ChatMessage>>;

    /// `POST /chats/:id/messages`, returns the assistant reply
    async fn send_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage>;

    /// `GET /folders`
    async fn folders(&self) -> ApiResult<FolderList>;

    /// `GET /folders/:id/files`, most recently updated first
    async fn folder_files(&self, folder_id: &str, page: &PageRequest)
        -> ApiResult<Page<FileItem>>;

    /// `POST /folders/:id/upload`
    async fn upload_file(&self, folder_id: &str, file: &UploadFile) -> ApiResult<UploadResponse>;

    /// `DELETE /files/:id`
    async fn delete_file(&self, file_id: &str) -> ApiResult<()>;

    /// `GET /files/:id/download`
    async fn download_file(&self, file_id: &str) -> ApiResult<Vec<u8>>;
}

/// Build the client selected by `config.use_mock_api`.
pub fn connect(config: &Config) -> Result<Arc<dyn ApiClient>> {
    if config.use_mock_api {
        tracing::debug!(
            "Using mock API (latency: {}, failure rate: {})",
            config.simulation.latency,
            config.simulation.failure_rate
        );
        let store = match config.mock_seed {
            Some(seed) => mock::InMemoryStore::seeded(seed),
            None => mock::InMemoryStore::generate(),
        };
        let client = mock::MockClient::new(Arc::new(store));
        Ok(Arc::new(simulate::Simulated::new(
            client,
            config.simulation.clone(),
        )))
    } else {
        tracing::debug!("Using HTTP API at {}", config.base_url);
        Ok(Arc::new(real::RealClient::new(config)?))
    }
}
