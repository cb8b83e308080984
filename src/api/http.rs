//! HTTP transport for the real backend
//!
//! Wraps reqwest::Client with base URL resolution, bearer auth, a request
//! timeout, and translation of every failure into an [`ApiError`].

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ApiError, ApiResult, ErrorCode};

/// Error body a backend may return with a non-2xx status.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Thin client bound to one backend.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<String>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL {}", base_url))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            auth_token,
        })
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::unknown(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.auth_token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET returning a JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        tracing::debug!("GET {}", url);
        let resp = send(self.request(Method::GET, url.clone()).query(query), &url).await?;
        read_json(resp, &url).await
    }

    /// POST a JSON body, returning a JSON body.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        tracing::debug!("POST {}", url);
        let resp = send(self.request(Method::POST, url.clone()).json(body), &url).await?;
        read_json(resp, &url).await
    }

    /// POST a multipart form, returning a JSON body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        tracing::debug!("POST (multipart) {}", url);
        let resp = send(self.request(Method::POST, url.clone()).multipart(form), &url).await?;
        read_json(resp, &url).await
    }

    /// DELETE expecting no body (usually 204).
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path)?;
        tracing::debug!("DELETE {}", url);
        send(self.request(Method::DELETE, url.clone()), &url).await?;
        Ok(())
    }

    /// GET returning the raw body.
    pub async fn get_bytes(&self, path: &str) -> ApiResult<Vec<u8>> {
        let url = self.url(path)?;
        tracing::debug!("GET (bytes) {}", url);
        let resp = send(self.request(Method::GET, url.clone()), &url).await?;
        let bytes = resp.bytes().await.map_err(|e| transport_error(e, &url))?;
        Ok(bytes.to_vec())
    }
}

async fn send(builder: RequestBuilder, url: &Url) -> ApiResult<Response> {
    let resp = builder.send().await.map_err(|e| transport_error(e, url))?;
    check_response(resp, url).await
}

/// Map a reqwest failure onto the error taxonomy.
fn transport_error(err: reqwest::Error, url: &Url) -> ApiError {
    tracing::debug!("Request to {} failed: {}", url, err);
    if err.is_timeout() {
        ApiError::timeout()
    } else if err.is_connect() || err.is_request() || err.is_body() {
        ApiError::network("Network error - check your connection")
    } else {
        ApiError::unknown(err.to_string())
    }
}

/// Check the status code and turn a failure body into an [`ApiError`].
async fn check_response(resp: Response, url: &Url) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    tracing::debug!("HTTP {} for {}: {}", status.as_u16(), url, text);

    Err(ApiError {
        code: body
            .code
            .map_or(ErrorCode::Http(status.as_u16()), |c| ErrorCode::parse(&c)),
        message: body
            .message
            .unwrap_or_else(|| status_text(status).to_string()),
        details: body.details,
    })
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown status")
}

async fn read_json<T: DeserializeOwned>(resp: Response, url: &Url) -> ApiResult<T> {
    // 204 carries no body; treat it as JSON null so `()` and `Option<_>` decode.
    let bytes = if resp.status() == StatusCode::NO_CONTENT {
        b"null".to_vec()
    } else {
        resp.bytes()
            .await
            .map_err(|e| transport_error(e, url))?
            .to_vec()
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        ApiError::unknown(format!("Failed to parse response from {}: {}", url, e))
    })
}
