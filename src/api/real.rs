//! [`ApiClient`] backed by the REST API.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::http::HttpClient;
use super::{ApiClient, ApiError, ApiResult, ChatQuery, NewChat, PageRequest};
use crate::config::Config;
use crate::models::{
    ChatMessage, ChatSummary, FileItem, FolderList, Page, UploadFile, UploadResponse, User,
};

/// Endpoint paths, relative to the configured base URL.
mod endpoints {
    pub const ME: &str = "/api/me";
    pub const CHATS: &str = "/api/chats";
    pub const FOLDERS: &str = "/api/folders";

    pub fn chat_messages(chat_id: &str) -> String {
        format!("/api/chats/{}/messages", chat_id)
    }

    pub fn folder_files(folder_id: &str) -> String {
        format!("/api/folders/{}/files", folder_id)
    }

    pub fn upload(folder_id: &str) -> String {
        format!("/api/folders/{}/upload", folder_id)
    }

    pub fn file(file_id: &str) -> String {
        format!("/api/files/{}", file_id)
    }

    pub fn download(file_id: &str) -> String {
        format!("/api/files/{}/download", file_id)
    }
}

pub struct RealClient {
    http: HttpClient,
}

impl RealClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = HttpClient::new(&config.base_url, config.timeout(), config.auth_token())?;
        Ok(Self { http })
    }

    #[cfg(test)]
    fn with_http(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ApiClient for RealClient {
    async fn current_user(&self) -> ApiResult<User> {
        self.http.get(endpoints::ME, &[]).await
    }

    async fn chats(&self, query: &ChatQuery) -> ApiResult<Page<ChatSummary>> {
        self.http.get(endpoints::CHATS, &query.query_pairs()).await
    }

    async fn create_chat(&self, request: &NewChat) -> ApiResult<ChatSummary> {
        self.http.post(endpoints::CHATS, request).await
    }

    async fn chat_messages(
        &self,
        chat_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<ChatMessage>> {
        self.http
            .get(&endpoints::chat_messages(chat_id), &page.query_pairs())
            .await
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage> {
        let body = serde_json::json!({ "content": content });
        self.http
            .post(&endpoints::chat_messages(chat_id), &body)
            .await
    }

    async fn folders(&self) -> ApiResult<FolderList> {
        self.http.get(endpoints::FOLDERS, &[]).await
    }

    async fn folder_files(
        &self,
        folder_id: &str,
        page: &PageRequest,
    ) -> ApiResult<Page<FileItem>> {
        self.http
            .get(&endpoints::folder_files(folder_id), &page.query_pairs())
            .await
    }

    async fn upload_file(&self, folder_id: &str, file: &UploadFile) -> ApiResult<UploadResponse> {
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                ApiError::validation(format!("Invalid MIME type {}: {}", file.mime_type, e))
            })?;
        let form = Form::new().part("file", part);
        self.http
            .post_multipart(&endpoints::upload(folder_id), form)
            .await
    }

    async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        self.http.delete(&endpoints::file(file_id)).await
    }

    async fn download_file(&self, file_id: &str) -> ApiResult<Vec<u8>> {
        self.http.get_bytes(&endpoints::download(file_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    /// Read headers plus a `Content-Length` body.
    async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Accept one request, hand it back to the test, reply with `body`.
    async fn capture_request(body: &'static str) -> (RealClient, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let _ = tx.send(read_request(&mut sock).await);
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = sock.write_all(reply.as_bytes()).await;
            let _ = sock.shutdown().await;
        });

        let http = HttpClient::new(
            &format!("http://{}", addr),
            Duration::from_secs(5),
            Some("tok123".to_string()),
        )
        .unwrap();
        (RealClient::with_http(http), rx)
    }

    #[tokio::test]
    async fn test_chats_query_string_and_auth() {
        let (client, rx) = capture_request(r#"{"items":[]}"#).await;
        let query = ChatQuery {
            search: Some("budget".to_string()),
            page: PageRequest::new(Some(5), Some("eyJwYWdlIjoxfQ==".to_string())),
        };

        let page = client.chats(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());

        let head = rx.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /api/chats?search=budget&limit=5&cursor="));
        assert!(head
            .to_lowercase()
            .contains("authorization: bearer tok123"));
    }

    #[tokio::test]
    async fn test_folder_files_path() {
        let (client, rx) = capture_request(r#"{"items":[],"nextCursor":"eyJwYWdlIjoxfQ=="}"#).await;
        let page = client
            .folder_files("folder_002", &PageRequest::default())
            .await
            .unwrap();
        assert!(page.has_more());

        let head = rx.await.unwrap();
        assert!(head.starts_with("GET /api/folders/folder_002/files HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_send_message_posts_content() {
        let reply = r#"{"id":"m2","chatId":"chat_001","role":"assistant","content":"ok","createdAt":"2025-01-01T00:00:00Z"}"#;
        let (client, rx) = capture_request(reply).await;

        let msg = client.send_message("chat_001", "hi there").await.unwrap();
        assert_eq!(msg.chat_id, "chat_001");

        let head = rx.await.unwrap();
        assert!(head.starts_with("POST /api/chats/chat_001/messages HTTP/1.1"));
        assert!(head.contains(r#"{"content":"hi there"}"#));
    }
}
