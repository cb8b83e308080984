//! Structured API errors shared by the mock and HTTP clients.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Machine-readable error code.
///
/// Serializes as the bare code string (`"NOT_FOUND"`, `"HTTP_502"`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Forbidden,
    ValidationError,
    NetworkError,
    Timeout,
    Unknown,
    /// Transport status with no code in the response body.
    Http(u16),
    /// Any other code a backend chose to send.
    Other(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "NOT_FOUND" => ErrorCode::NotFound,
            "FORBIDDEN" => ErrorCode::Forbidden,
            "VALIDATION_ERROR" => ErrorCode::ValidationError,
            "NETWORK_ERROR" => ErrorCode::NetworkError,
            "TIMEOUT" => ErrorCode::Timeout,
            "UNKNOWN_ERROR" => ErrorCode::Unknown,
            other => match other.strip_prefix("HTTP_").and_then(|s| s.parse().ok()) {
                Some(status) => ErrorCode::Http(status),
                None => ErrorCode::Other(other.to_string()),
            },
        }
    }

    /// Whether retrying the same call might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ErrorCode::NetworkError | ErrorCode::Timeout => true,
            ErrorCode::Http(status) => *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::NotFound => f.write_str("NOT_FOUND"),
            ErrorCode::Forbidden => f.write_str("FORBIDDEN"),
            ErrorCode::ValidationError => f.write_str("VALIDATION_ERROR"),
            ErrorCode::NetworkError => f.write_str("NETWORK_ERROR"),
            ErrorCode::Timeout => f.write_str("TIMEOUT"),
            ErrorCode::Unknown => f.write_str("UNKNOWN_ERROR"),
            ErrorCode::Http(status) => write!(f, "HTTP_{}", status),
            ErrorCode::Other(code) => f.write_str(code),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::parse(&code))
    }
}

/// Error payload returned by every API call: code, message, optional details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, "Request timeout")
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trips_through_json() {
        let err = ApiError::not_found("Chat chat_999 not found").with_detail("chatId", "chat_999");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["details"]["chatId"], "chat_999");

        let back: ApiError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_parse_http_and_custom_codes() {
        assert_eq!(ErrorCode::parse("HTTP_503"), ErrorCode::Http(503));
        assert_eq!(
            ErrorCode::parse("HTTP_abc"),
            ErrorCode::Other("HTTP_abc".to_string())
        );
        assert_eq!(
            ErrorCode::parse("AUTH_FAILED"),
            ErrorCode::Other("AUTH_FAILED".to_string())
        );
        assert_eq!(ErrorCode::Http(404).to_string(), "HTTP_404");
    }

    #[test]
    fn test_details_omitted_when_empty() {
        let json = serde_json::to_string(&ApiError::timeout()).unwrap();
        assert_eq!(json, r#"{"code":"TIMEOUT","message":"Request timeout"}"#);
    }

    #[test]
    fn test_transient_classification() {
        assert!(ErrorCode::NetworkError.is_transient());
        assert!(ErrorCode::Http(502).is_transient());
        assert!(!ErrorCode::Http(404).is_transient());
        assert!(!ErrorCode::ValidationError.is_transient());
    }

    #[test]
    fn test_display_includes_code() {
        let err = ApiError::forbidden("No upload permission for folder folder_003");
        assert_eq!(
            err.to_string(),
            "FORBIDDEN: No upload permission for folder folder_003"
        );
    }
}
