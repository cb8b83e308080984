//! Latency and failure injection for the mock backend.
//!
//! [`Simulated`] wraps any [`ApiClient`] and, before delegating each call,
//! sleeps for a random duration and occasionally fails with
//! `NETWORK_ERROR`. The wrapped client stays free of timing and randomness.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, ApiResult, ChatQuery, NewChat, PageRequest};
use crate::models::{
    ChatMessage, ChatSummary, FileItem, FolderList, Page, UploadFile, UploadResponse, User,
};

/// Default probability that a simulated call fails.
pub const DEFAULT_FAILURE_RATE: f64 = 0.001;

/// Inclusive delay bounds in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Most endpoints.
pub const STANDARD_DELAY: DelayRange = DelayRange {
    min_ms: 200,
    max_ms: 1200,
};

/// Sending a message: request latency plus time to "generate" the reply.
pub const REPLY_DELAY: DelayRange = DelayRange {
    min_ms: 800,
    max_ms: 2800,
};

/// Uploads take longer.
pub const UPLOAD_DELAY: DelayRange = DelayRange {
    min_ms: 800,
    max_ms: 2500,
};

/// Knobs for the simulated network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Sleep before each call
    pub latency: bool,
    /// Probability in `[0, 1]` that a call fails with `NETWORK_ERROR`
    pub failure_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency: true,
            failure_rate: DEFAULT_FAILURE_RATE,
        }
    }
}

/// Sleep for a uniformly random duration in `[min_ms, max_ms]`.
pub async fn random_delay(min_ms: u64, max_ms: u64) {
    let ms = if max_ms <= min_ms {
        min_ms
    } else {
        rand::thread_rng().gen_range(min_ms..=max_ms)
    };
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Fail with `NETWORK_ERROR` with probability `rate`.
///
/// Rates at or below zero (and NaN) never fail; rates above one always do.
pub fn maybe_fail(rate: f64) -> ApiResult<()> {
    if rate.is_nan() || rate <= 0.0 {
        return Ok(());
    }
    if rand::thread_rng().gen_bool(rate.min(1.0)) {
        return Err(ApiError::network("Simulated network failure"));
    }
    Ok(())
}

/// Decorator applying [`random_delay`] and [`maybe_fail`] to every call.
pub struct Simulated<C> {
    inner: C,
    config: SimulationConfig,
}

impl<C: ApiClient> Simulated<C> {
    pub fn new(inner: C, config: SimulationConfig) -> Self {
        Self { inner, config }
    }

    async fn network(&self, operation: &str, range: DelayRange) -> ApiResult<()> {
        if self.config.latency {
            random_delay(range.min_ms, range.max_ms).await;
        }
        maybe_fail(self.config.failure_rate).map_err(|e| {
            tracing::warn!("Injected failure in {}: {}", operation, e);
            e
        })
    }
}

#[async_trait]
impl<C: ApiClient> ApiClient for Simulated<C> {
    async fn current_user(&self) -> ApiResult<User> {
        self.network("current_user", STANDARD_DELAY).await?;
        self.inner.current_user().await
    }

    async fn chats(&self, query: &ChatQuery) -> ApiResult<Page<ChatSummary>> {
        self.network("chats", STANDARD_DELAY).await?;
        self.inner.chats(query).await
    }

    async fn create_chat(&self, request: &NewChat) -> ApiResult<ChatSummary> {
        self.network("create_chat", STANDARD_DELAY).await?;
        self.inner.create_chat(request).await
    }

    async fn chat_messages(
        &self,
        chat_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<ChatMessage>> {
        self.network("chat_messages", STANDARD_DELAY).await?;
        self.inner.chat_messages(chat_id, page).await
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage> {
        self.network("send_message", REPLY_DELAY).await?;
        self.inner.send_message(chat_id, content).await
    }

    async fn folders(&self) -> ApiResult<FolderList> {
        self.network("folders", STANDARD_DELAY).await?;
        self.inner.folders().await
    }

    async fn folder_files(
        &self,
        folder_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<FileItem>> {
        self.network("folder_files", STANDARD_DELAY).await?;
        self.inner.folder_files(folder_id, page).await
    }

    async fn upload_file(&self, folder_id: &str, file: &UploadFile) -> ApiResult<UploadResponse> {
        self.network("upload_file", UPLOAD_DELAY).await?;
        self.inner.upload_file(folder_id, file).await
    }

    async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        self.network("delete_file", STANDARD_DELAY).await?;
        self.inner.delete_file(file_id).await
    }

    async fn download_file(&self, file_id: &str) -> ApiResult<Vec<u8>> {
        self.network("download_file", STANDARD_DELAY).await?;
        self.inner.download_file(file_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;
    use crate::api::mock::{FixtureStore, InMemoryStore, MockClient};
    use crate::api::ErrorCode;

    fn simulated(config: SimulationConfig) -> (Simulated<MockClient>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::seeded(11));
        let client = MockClient::new(store.clone());
        (Simulated::new(client, config), store)
    }

    #[test]
    fn test_maybe_fail_extremes() {
        for _ in 0..100 {
            assert!(maybe_fail(0.0).is_ok());
            assert!(maybe_fail(f64::NAN).is_ok());
            assert_eq!(maybe_fail(1.0).unwrap_err().code, ErrorCode::NetworkError);
            assert!(maybe_fail(7.5).is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_delay_within_bounds() {
        for _ in 0..20 {
            let start = Instant::now();
            random_delay(200, 1200).await;
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(200), "{:?}", elapsed);
            assert!(elapsed <= Duration::from_millis(1201), "{:?}", elapsed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_inverted_bounds_use_min() {
        let start = Instant::now();
        random_delay(300, 100).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(301));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_uses_upload_delay() {
        let (client, _) = simulated(SimulationConfig {
            latency: true,
            failure_rate: 0.0,
        });
        let file = UploadFile::new("notes.txt", "text/plain", b"hello".to_vec());

        let start = Instant::now();
        let resp = client.upload_file("folder_001", &file).await.unwrap();
        assert!(resp.success);
        assert!(start.elapsed() >= Duration::from_millis(UPLOAD_DELAY.min_ms));
    }

    #[tokio::test]
    async fn test_always_failing_network_leaves_store_untouched() {
        let (client, store) = simulated(SimulationConfig {
            latency: false,
            failure_rate: 1.0,
        });
        let chat_id = store.list_chats()[0].id.clone();
        let before = store.list_messages(&chat_id).unwrap().len();

        let err = client.send_message(&chat_id, "hello").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(store.list_messages(&chat_id).unwrap().len(), before);

        let err = client.current_user().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
    }

    #[tokio::test]
    async fn test_reliable_network_delegates() {
        let (client, _) = simulated(SimulationConfig {
            latency: false,
            failure_rate: 0.0,
        });
        let user = client.current_user().await.unwrap();
        assert_eq!(user.id, "user_001");

        let err = client
            .chat_messages("chat_missing", &PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
