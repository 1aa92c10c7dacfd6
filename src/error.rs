use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the chat endpoint.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to reach chat endpoint {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to read chat endpoint response body")]
    Body(#[source] reqwest::Error),
}

/// Errors surfaced inline by the widget. `Display` is the text the user sees.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Please ask a question or use a suggestion.")]
    Validation,
    #[error("Something went wrong!")]
    Network(#[from] NetworkError),
}

impl WidgetError {
    pub fn is_validation(&self) -> bool {
        matches!(self, WidgetError::Validation)
    }
}
