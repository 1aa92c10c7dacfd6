pub mod chat;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod suggestions;
pub mod view;
pub mod web_server;
pub mod widget;

pub use config::WidgetConfig;
pub use endpoint::ChatEndpointClient;
pub use error::{NetworkError, WidgetError};
pub use session::{ChatMessage, ChatRequest, Effect, SessionState, UiEvent, WidgetState};
pub use view::{ServerMessage, WidgetView};
pub use widget::ChatWidget;
