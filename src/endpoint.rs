use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::config::WidgetConfig;
use crate::error::NetworkError;
use crate::session::ChatMessage;

// Body expected by the chat endpoint.
#[derive(Serialize)]
struct ChatEndpointRequest<'a> {
    history: Vec<HistoryEntry<'a>>,
    message: &'a str,
}

#[derive(Serialize)]
struct HistoryEntry<'a> {
    role: &'a str,
    parts: &'a str,
}

impl<'a> From<&'a ChatMessage> for HistoryEntry<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: &message.role,
            parts: &message.text,
        }
    }
}

/// Thin client for the remote chat completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatEndpointClient {
    client: Client,
    url: String,
}

impl ChatEndpointClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &WidgetConfig) -> Result<Self, NetworkError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| NetworkError::Transport {
            url: config.endpoint_url.clone(),
            source,
        })?;
        Ok(Self {
            client,
            url: config.endpoint_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the prior transcript and the new message; the reply body is
    /// returned verbatim on any 2xx status.
    #[instrument(skip(self, history, message), fields(url = %self.url, history_len = history.len(), message_len = message.len()))]
    pub async fn send(&self, history: &[ChatMessage], message: &str) -> Result<String, NetworkError> {
        let payload = ChatEndpointRequest {
            history: history.iter().map(HistoryEntry::from).collect(),
            message,
        };

        // .json() sets Content-Type: application/json
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Chat endpoint request failed");
            return Err(NetworkError::Status { status, body });
        }

        let reply = response.text().await.map_err(NetworkError::Body)?;
        debug!(reply_len = reply.len(), "Received chat endpoint reply");
        Ok(reply)
    }
}
