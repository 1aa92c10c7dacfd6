//! Widget state machine.
//!
//! `SessionState` holds everything the widget shows. Every user action is a
//! method that mutates it and returns the [`Effect`]s the front end must carry
//! out. The only asynchronous step, the endpoint call, is handed out as
//! [`Effect::Send`] and fed back through [`SessionState::complete`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NetworkError, WidgetError};
use crate::suggestions;

pub const DEFAULT_USER_LABEL: &str = "You";
pub const DEFAULT_ASSISTANT_LABEL: &str = "Assistant";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    Idle,
    AwaitingResponse,
    ErrorShown,
}

/// A user action, as delivered by either front end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Edit { text: String },
    SuggestActivity,
    BrainstormNames,
    Submit,
    Clear,
    KeyPress { key: String },
}

/// Everything needed to issue one endpoint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub id: u64,
    pub history: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the endpoint and report back via `complete`.
    Send(ChatRequest),
    /// Give keyboard focus back to the input control.
    FocusInput,
}

#[derive(Debug)]
pub struct SessionState {
    draft_input: String,
    transcript: Vec<ChatMessage>,
    state: WidgetState,
    error: Option<WidgetError>,
    pending_suggestion: Option<String>,
    in_flight: Option<u64>,
    next_request_id: u64,
    user_label: String,
    assistant_label: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_USER_LABEL, DEFAULT_ASSISTANT_LABEL)
    }
}

impl SessionState {
    pub fn new(user_label: impl Into<String>, assistant_label: impl Into<String>) -> Self {
        Self {
            draft_input: String::new(),
            transcript: Vec::new(),
            state: WidgetState::Idle,
            error: None,
            pending_suggestion: None,
            in_flight: None,
            next_request_id: 1,
            user_label: user_label.into(),
            assistant_label: assistant_label.into(),
        }
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == WidgetState::AwaitingResponse
    }

    pub fn error(&self) -> Option<&WidgetError> {
        self.error.as_ref()
    }

    /// User-visible error text, empty when no error is shown.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn pending_suggestion(&self) -> Option<&str> {
        self.pending_suggestion.as_deref()
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, event: UiEvent, rng: &mut R) -> Vec<Effect> {
        match event {
            UiEvent::Edit { text } => {
                self.edit(text);
                Vec::new()
            }
            UiEvent::SuggestActivity => {
                self.request_suggestion(rng);
                Vec::new()
            }
            UiEvent::BrainstormNames => {
                self.request_name_brainstorm(rng);
                Vec::new()
            }
            UiEvent::Submit => self.submit(),
            UiEvent::Clear => self.clear(),
            UiEvent::KeyPress { key } => self.key_press(&key),
        }
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        if self.is_loading() {
            return;
        }
        self.draft_input = text.into();
    }

    pub fn request_suggestion<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_loading() {
            return;
        }
        let suggestion = suggestions::pick_activity(rng);
        debug!(suggestion, "Activity suggested");
        self.draft_input = suggestion.to_string();
        self.pending_suggestion = Some(suggestion.to_string());
    }

    pub fn request_name_brainstorm<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_loading() {
            return;
        }
        let prompt = suggestions::pick_brainstorm(rng);
        debug!(prompt, "Name brainstorm suggested");
        self.draft_input = prompt.to_string();
    }

    /// Draft first, then pending suggestion.
    pub fn effective_message(&self) -> Option<&str> {
        if !self.draft_input.is_empty() {
            Some(&self.draft_input)
        } else {
            self.pending_suggestion.as_deref().filter(|s| !s.is_empty())
        }
    }

    pub fn submit(&mut self) -> Vec<Effect> {
        if self.is_loading() {
            debug!("Submit ignored while a response is pending");
            return Vec::new();
        }

        let Some(message) = self.effective_message().map(str::to_string) else {
            info!("Submit rejected: nothing to send");
            self.error = Some(WidgetError::Validation);
            self.state = WidgetState::ErrorShown;
            return Vec::new();
        };

        self.pending_suggestion = None;
        self.state = WidgetState::AwaitingResponse;

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(id);

        info!(request_id = id, history_len = self.transcript.len(), "Submitting message");
        vec![Effect::Send(ChatRequest {
            id,
            history: self.transcript.clone(),
            message,
        })]
    }

    /// Feed back the outcome of the request with the given id. Outcomes for a
    /// request that is no longer in flight (the session was cleared) are
    /// dropped.
    pub fn complete(&mut self, request: &ChatRequest, outcome: Result<String, NetworkError>) -> Vec<Effect> {
        if self.in_flight != Some(request.id) {
            debug!(request_id = request.id, "Dropping stale response");
            return Vec::new();
        }
        self.in_flight = None;

        match outcome {
            Ok(reply) => {
                self.transcript
                    .push(ChatMessage::new(self.user_label.clone(), request.message.clone()));
                self.transcript
                    .push(ChatMessage::new(self.assistant_label.clone(), reply));
                self.draft_input.clear();
                self.error = None;
                self.state = WidgetState::Idle;
                vec![Effect::FocusInput]
            }
            Err(err) => {
                warn!(request_id = request.id, error = %err, "Chat request failed");
                self.error = Some(WidgetError::Network(err));
                self.state = WidgetState::ErrorShown;
                Vec::new()
            }
        }
    }

    pub fn clear(&mut self) -> Vec<Effect> {
        if let Some(id) = self.in_flight.take() {
            info!(request_id = id, "Clearing session with a request in flight");
        }
        self.draft_input.clear();
        self.error = None;
        self.transcript.clear();
        self.pending_suggestion = None;
        self.state = WidgetState::Idle;
        vec![Effect::FocusInput]
    }

    pub fn key_press(&mut self, key: &str) -> Vec<Effect> {
        if key == "Enter" {
            self.submit()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use reqwest::StatusCode;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn take_request(effects: Vec<Effect>) -> ChatRequest {
        match effects.as_slice() {
            [Effect::Send(request)] => request.clone(),
            other => panic!("expected a single send, got {:?}", other),
        }
    }

    fn server_error() -> NetworkError {
        NetworkError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }
    }

    #[test]
    fn test_initial_state() {
        let session = SessionState::default();
        assert_eq!(session.state(), WidgetState::Idle);
        assert!(session.transcript().is_empty());
        assert_eq!(session.draft_input(), "");
        assert_eq!(session.error_message(), "");
        assert!(session.pending_suggestion().is_none());
        assert!(!session.is_loading());
    }

    #[test]
    fn test_empty_submit_is_validation_error() {
        let mut session = SessionState::default();
        let effects = session.submit();

        assert!(effects.is_empty());
        assert_eq!(session.state(), WidgetState::ErrorShown);
        assert!(session.error().is_some_and(WidgetError::is_validation));
        assert_eq!(
            session.error_message(),
            "Please ask a question or use a suggestion."
        );
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_successful_submit_appends_exchange() {
        let mut session = SessionState::default();
        session.edit("How to play soccer?");

        let request = take_request(session.submit());
        assert_eq!(session.state(), WidgetState::AwaitingResponse);
        assert!(request.history.is_empty());
        assert_eq!(request.message, "How to play soccer?");

        let effects = session.complete(&request, Ok("Soccer is a team sport...".to_string()));
        assert_eq!(effects, vec![Effect::FocusInput]);
        assert_eq!(
            session.transcript(),
            &[
                ChatMessage::new("You", "How to play soccer?"),
                ChatMessage::new("Assistant", "Soccer is a team sport..."),
            ]
        );
        assert_eq!(session.draft_input(), "");
        assert_eq!(session.error_message(), "");
        assert_eq!(session.state(), WidgetState::Idle);
    }

    #[test]
    fn test_second_request_carries_prior_history() {
        let mut session = SessionState::default();
        session.edit("first");
        let first = take_request(session.submit());
        session.complete(&first, Ok("one".to_string()));

        session.edit("second");
        let second = take_request(session.submit());
        assert_eq!(second.history.len(), 2);
        assert_eq!(second.history[0].text, "first");
        assert_eq!(second.history[1].text, "one");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_submit_while_awaiting_is_noop() {
        let mut session = SessionState::default();
        session.edit("hello");
        let request = take_request(session.submit());

        assert!(session.submit().is_empty());
        assert!(session.key_press("Enter").is_empty());
        assert_eq!(session.state(), WidgetState::AwaitingResponse);

        session.complete(&request, Ok("hi".to_string()));
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_input_ignored_while_awaiting() {
        let mut session = SessionState::default();
        let mut rng = rng();
        session.edit("hello");
        let _request = take_request(session.submit());

        session.edit("changed");
        session.request_suggestion(&mut rng);
        session.request_name_brainstorm(&mut rng);
        assert_eq!(session.draft_input(), "hello");
        assert!(session.pending_suggestion().is_none());
    }

    #[test]
    fn test_failure_keeps_draft_and_transcript() {
        let mut session = SessionState::default();
        session.edit("first");
        let ok = take_request(session.submit());
        session.complete(&ok, Ok("one".to_string()));

        session.edit("retry me");
        let failing = take_request(session.submit());
        let effects = session.complete(&failing, Err(server_error()));

        assert!(effects.is_empty());
        assert_eq!(session.state(), WidgetState::ErrorShown);
        assert_eq!(session.error_message(), "Something went wrong!");
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.draft_input(), "retry me");

        let retry = take_request(session.submit());
        assert_eq!(retry.message, "retry me");
    }

    #[test]
    fn test_pending_suggestion_used_when_draft_empty() {
        let mut session = SessionState::default();
        let mut rng = rng();
        session.request_suggestion(&mut rng);
        let suggestion = session.pending_suggestion().map(str::to_string);
        assert!(suggestion.is_some());
        assert_eq!(Some(session.draft_input()), suggestion.as_deref());

        session.edit("");
        let request = take_request(session.submit());
        assert_eq!(Some(request.message.as_str()), suggestion.as_deref());
        assert!(session.pending_suggestion().is_none());
    }

    #[test]
    fn test_pending_suggestion_is_not_a_validation_error() {
        let mut session = SessionState::default();
        session.pending_suggestion = Some("Recommend a book".to_string());

        let request = take_request(session.submit());
        assert_eq!(request.message, "Recommend a book");
        assert!(session.error().is_none());
        assert_eq!(session.state(), WidgetState::AwaitingResponse);
    }

    #[test]
    fn test_suggestion_does_not_change_state() {
        let mut session = SessionState::default();
        let mut rng = rng();
        session.submit();
        assert_eq!(session.state(), WidgetState::ErrorShown);

        session.request_suggestion(&mut rng);
        assert_eq!(session.state(), WidgetState::ErrorShown);
        assert!(suggestions::ACTIVITY_SUGGESTIONS.contains(&session.draft_input()));
    }

    #[test]
    fn test_brainstorm_leaves_pending_suggestion_alone() {
        let mut session = SessionState::default();
        let mut rng = rng();
        session.request_suggestion(&mut rng);
        let pending = session.pending_suggestion().map(str::to_string);

        session.request_name_brainstorm(&mut rng);
        assert!(suggestions::NAME_BRAINSTORMS.contains(&session.draft_input()));
        assert_eq!(session.pending_suggestion().map(str::to_string), pending);
    }

    #[test]
    fn test_clear_resets_from_every_state() {
        let mut rng = rng();

        let mut errored = SessionState::default();
        errored.submit();
        errored.request_suggestion(&mut rng);
        assert_eq!(errored.state(), WidgetState::ErrorShown);
        assert!(errored.pending_suggestion().is_some());

        let mut awaiting = SessionState::default();
        awaiting.edit("hello");
        let request = take_request(awaiting.submit());

        let mut idle = SessionState::default();
        idle.edit("draft");
        idle.request_suggestion(&mut rng);

        for session in [&mut errored, &mut awaiting, &mut idle] {
            assert_eq!(session.clear(), vec![Effect::FocusInput]);
            assert_eq!(session.state(), WidgetState::Idle);
            assert!(session.transcript().is_empty());
            assert_eq!(session.draft_input(), "");
            assert_eq!(session.error_message(), "");
            assert!(session.pending_suggestion().is_none());
        }

        // A response for the request abandoned by clear is dropped.
        assert!(awaiting.complete(&request, Ok("late".to_string())).is_empty());
        assert!(awaiting.transcript().is_empty());
        assert_eq!(awaiting.state(), WidgetState::Idle);
    }

    #[test]
    fn test_enter_submits_other_keys_do_not() {
        let mut session = SessionState::default();
        session.edit("hello");
        assert!(session.key_press("a").is_empty());
        assert_eq!(session.state(), WidgetState::Idle);

        let request = take_request(session.key_press("Enter"));
        assert_eq!(request.message, "hello");
    }

    #[test]
    fn test_custom_labels() {
        let mut session = SessionState::new("Me", "Gemini");
        session.edit("hi");
        let request = take_request(session.submit());
        session.complete(&request, Ok("hello".to_string()));
        assert_eq!(session.transcript()[0].role, "Me");
        assert_eq!(session.transcript()[1].role, "Gemini");
    }

    #[test]
    fn test_apply_dispatches_events() {
        let mut session = SessionState::default();
        let mut rng = rng();

        session.apply(UiEvent::Edit { text: "hey".to_string() }, &mut rng);
        assert_eq!(session.draft_input(), "hey");

        let effects = session.apply(UiEvent::KeyPress { key: "Enter".to_string() }, &mut rng);
        assert!(matches!(effects.as_slice(), [Effect::Send(_)]));

        let effects = session.apply(UiEvent::Clear, &mut rng);
        assert_eq!(effects, vec![Effect::FocusInput]);
    }

    #[test]
    fn test_ui_event_wire_format() {
        let event: UiEvent = serde_json::from_str(r#"{"type":"edit","text":"abc"}"#).unwrap();
        assert_eq!(event, UiEvent::Edit { text: "abc".to_string() });

        let event: UiEvent = serde_json::from_str(r#"{"type":"key_press","key":"Enter"}"#).unwrap();
        assert_eq!(event, UiEvent::KeyPress { key: "Enter".to_string() });

        let event: UiEvent = serde_json::from_str(r#"{"type":"suggest_activity"}"#).unwrap();
        assert_eq!(event, UiEvent::SuggestActivity);
    }
}
