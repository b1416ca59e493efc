use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::state::Message;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body of a `POST /api/chat` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a chat reply means for the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Answer(String),
    /// Failure reported by the server inside an otherwise good reply.
    AppError(String),
}

impl ChatReply {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            response: None,
            error: Some(error.into()),
        }
    }

    /// A non-empty `error` wins over `response`; a reply with neither is unusable.
    pub fn into_outcome(self) -> Result<ChatOutcome, ClientError> {
        match (self.error, self.response) {
            (Some(error), _) if !error.is_empty() => Ok(ChatOutcome::AppError(error)),
            (_, Some(response)) => Ok(ChatOutcome::Answer(response)),
            _ => Err(ClientError::EmptyReply),
        }
    }
}

/// The two endpoints the chat panel talks to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `GET /api/history`: prior messages, oldest first.
    async fn history(&self) -> Result<Vec<Message>, ClientError>;

    /// `POST /api/chat` with `{"message": text}`.
    async fn chat(&self, message: &str) -> Result<ChatReply, ClientError>;
}

/// HTTP implementation of [`ChatBackend`].
///
/// Keeps a cookie jar so the backend's session cookie survives between the
/// history load and later sends, the way a browser tab would.
#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read a JSON body whatever the status; the backend reports application
    /// errors in the body, sometimes alongside a 4xx.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() {
            warn!(%status, %url, "backend returned non-success status");
        }
        let bytes = response.bytes().await?;
        debug!(%status, %url, len = bytes.len(), "backend response");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn history(&self) -> Result<Vec<Message>, ClientError> {
        let url = format!("{}/api/history", self.base_url);

        let response = self.client.get(&url).send().await?;

        Self::read_json(response).await
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ClientError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        Self::read_json(response).await
    }
}
