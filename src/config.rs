use std::time::Duration;

use clap::Args;

use crate::session::{DEFAULT_ASSISTANT_LABEL, DEFAULT_USER_LABEL};

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8000/gemini";

/// Settings shared by every front end.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// URL the chat request is POSTed to.
    #[arg(long, env = "CHAT_ENDPOINT_URL", default_value = DEFAULT_ENDPOINT_URL)]
    pub endpoint_url: String,

    /// Speaker label for messages you send.
    #[arg(long, env = "CHAT_USER_LABEL", default_value = DEFAULT_USER_LABEL)]
    pub user_label: String,

    /// Speaker label for endpoint replies.
    #[arg(long, env = "CHAT_ASSISTANT_LABEL", default_value = DEFAULT_ASSISTANT_LABEL)]
    pub assistant_label: String,

    /// Give up on the endpoint after this many seconds. Waits forever when unset.
    #[arg(long = "timeout", value_name = "SECS", env = "CHAT_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            user_label: DEFAULT_USER_LABEL.to_string(),
            assistant_label: DEFAULT_ASSISTANT_LABEL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl WidgetConfig {
    pub fn with_endpoint(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
