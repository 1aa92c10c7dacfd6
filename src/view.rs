//! What the browser needs to draw the widget, computed from the session.

use serde::Serialize;

use crate::session::{ChatMessage, Effect, SessionState, WidgetState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetView {
    pub state: WidgetState,
    pub draft: String,
    pub transcript: Vec<ChatMessage>,
    pub is_loading: bool,
    pub error: String,
    pub show_send: bool,
    pub show_clear: bool,
    pub focus_input: bool,
}

impl WidgetView {
    pub fn render(session: &SessionState, effects: &[Effect]) -> Self {
        let is_loading = session.is_loading();
        let has_error = session.error().is_some();
        Self {
            state: session.state(),
            draft: session.draft_input().to_string(),
            transcript: session.transcript().to_vec(),
            is_loading,
            error: session.error_message(),
            show_send: !is_loading && !has_error,
            show_clear: !is_loading && has_error,
            focus_input: effects.contains(&Effect::FocusInput),
        }
    }
}

/// Server to browser message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    View(WidgetView),
}
