//! HTTP transport for the chat endpoint.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::types::{BotReply, ChatRequest, ChatResponseBody};
use crate::config::EndpointConfig;
use crate::error::{ChatError, Result};

/// One request/response exchange with the chat backend.
///
/// The widget only ever talks to this trait, so tests and embedders can
/// substitute their own transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post `request` and return the validated reply.
    async fn send(&self, request: &ChatRequest) -> Result<BotReply>;
}

/// reqwest-backed [`ChatTransport`].
///
/// # Example
///
/// ```rust,no_run
/// use bank_chat_widget::api::{ChatRequest, ChatTransport, HttpChatClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpChatClient::new("http://localhost:5000", "/api/chat")?;
/// let reply = client.send(&ChatRequest::new("Quel est mon solde ?")).await?;
/// println!("{reply:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpChatClient {
    /// Create a client posting to `chat_path` under `base_url`.
    pub fn new(base_url: impl AsRef<str>, chat_path: &str) -> Result<Self> {
        Self::with_client(base_url, chat_path, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        chat_path: &str,
        http: reqwest::Client,
    ) -> Result<Self> {
        let endpoint = Url::parse(base_url.as_ref())?.join(chat_path)?;
        Ok(Self { endpoint, http })
    }

    /// Create a client from the endpoint section of the widget config.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.chat_path)
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn handle_response(response: reqwest::Response) -> Result<BotReply> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body: ChatResponseBody = serde_json::from_slice(&bytes)?;
        BotReply::try_from(body)
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<BotReply> {
        debug!(
            name: "api.chat.request",
            endpoint = %self.endpoint,
            chars = request.message.chars().count(),
            "Posting chat message"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }
}
