use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Path of the chat endpoint, relative to the page's origin.
pub const CHAT_ENDPOINT: &str = "/chat";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid page url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("chat request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("chat response was not a JSON object: {0}")]
    Decode(reqwest::Error),

    /// The body parsed as JSON but had no string `response` field.
    #[error("chat response (status {status}) has no 'response' text")]
    MissingResponse { status: u16 },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    chat_type: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
}

/// Wire shape of the reply; `response` is checked for a string separately.
#[derive(Deserialize)]
struct ReplyBody {
    #[serde(default)]
    response: Option<Value>,
}

/// Sends one user turn and waits for the assistant's reply.
///
/// A single attempt: no timeout, retry, or cancellation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_turn(&self, message: &str, chat_type: &str) -> Result<ChatReply, TransportError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: Url,
}

impl ChatClient {
    /// Build a client for the backend serving `page_url`. Only the origin is
    /// kept; the request always goes to `/chat` on it.
    pub fn from_page_url(page_url: &str) -> Result<Self, TransportError> {
        let endpoint = parse_url(page_url)?
            .join(CHAT_ENDPOINT)
            .map_err(|e| TransportError::InvalidUrl {
                url: page_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ChatClient {
    async fn send_turn(&self, message: &str, chat_type: &str) -> Result<ChatReply, TransportError> {
        log::debug!("POST {} (chat_type={})", self.endpoint, chat_type);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ChatRequest { message, chat_type })
            .send()
            .await?;

        // The body is parsed regardless of status; a backend error page that
        // still carries a `response` is shown like any other reply.
        let status = response.status();
        if !status.is_success() {
            log::warn!("chat endpoint returned status {}", status);
        }

        let body: ReplyBody = response.json().await.map_err(TransportError::Decode)?;
        match body.response {
            Some(Value::String(text)) => Ok(ChatReply { response: text }),
            _ => Err(TransportError::MissingResponse {
                status: status.as_u16(),
            }),
        }
    }
}

/// Navigation path of a page URL, used to derive the chat type.
pub fn page_path(page_url: &str) -> Result<String, TransportError> {
    Ok(parse_url(page_url)?.path().to_string())
}

fn parse_url(page_url: &str) -> Result<Url, TransportError> {
    Url::parse(page_url).map_err(|e| TransportError::InvalidUrl {
        url: page_url.to_string(),
        reason: e.to_string(),
    })
}
