//! HTTP client for the chat server and the transport seam the engine talks
//! through. Error display strings are user-facing: submission failures are
//! rendered into the transcript verbatim.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServerConfig;
use crate::message::HistoryEntry;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out. Try again.")]
    Timeout,
    #[error("Cannot reach the server. Is it running?")]
    Connect,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{}", status_message(.0))]
    Status(u16),
    #[error("Unexpected server response.")]
    Decode,
}

fn status_message(code: &u16) -> String {
    match *code {
        400 => "Bad request. Try a shorter message.".to_string(),
        413 => "File too large for the server.".to_string(),
        429 => "Rate limited. Wait a moment and try again.".to_string(),
        500 | 503 => "Server error. Try again.".to_string(),
        code => format!("Server returned HTTP {code}."),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect
        } else if e.is_decode() {
            Self::Decode
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// JSON body for `POST /chat`: the message plus a bounded trailing window of
/// prior turns for multi-turn context.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Reply body of `/chat` and `/upload`. The transcript never renders this
/// directly; the forced resync paints the authoritative entry instead. It
/// feeds the session log and is handed to callers for their own use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// An image picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Transport seam between the engine and the server. Tests drive the engine
/// with in-process implementations of this trait.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Full authoritative history, oldest entry first.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError>;

    async fn upload_image(
        &self,
        file: FileSelection,
        message: String,
    ) -> Result<ChatReply, ApiError>;
}

/// reqwest-backed [`Backend`] speaking to the configured chat server.
pub struct ApiClient {
    client: reqwest::Client,
    upload_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let upload_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            upload_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let response = self
            .client
            .get(format!("{}/history", self.base_url))
            .send()
            .await?;
        let history = check_status(response)?
            .json()
            .await
            .map_err(|_| ApiError::Decode)?;
        Ok(history)
    }

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&request)
            .send()
            .await?;
        // A 2xx with an undecodable body still counts as sent: the transcript
        // is painted from the resync, not from this reply.
        Ok(check_status(response)?.json().await.unwrap_or_default())
    }

    async fn upload_image(
        &self,
        file: FileSelection,
        message: String,
    ) -> Result<ChatReply, ApiError> {
        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("message", message);
        let response = self
            .upload_client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response)?.json().await.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_to_friendly_messages() {
        assert_eq!(
            ApiError::Status(400).to_string(),
            "Bad request. Try a shorter message."
        );
        assert_eq!(
            ApiError::Status(413).to_string(),
            "File too large for the server."
        );
        assert_eq!(
            ApiError::Status(503).to_string(),
            "Server error. Try again."
        );
        assert_eq!(ApiError::Status(418).to_string(), "Server returned HTTP 418.");
    }

    #[test]
    fn chat_request_serializes_message_and_raw_history() {
        let request = ChatRequest {
            message: "next".into(),
            history: vec![
                HistoryEntry::new("user", "hi"),
                HistoryEntry::new("assistant", "hello"),
            ],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "message": "next",
                "history": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                ],
            })
        );
    }

    #[test]
    fn reply_fields_all_default_when_absent() {
        let reply: ChatReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.content, "");
        assert!(reply.source.is_none());
        assert!(reply.reasoning.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ServerConfig {
            base_url: "http://localhost:8000/".into(),
            ..ServerConfig::default()
        };
        let client = ApiClient::new(&config);
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
