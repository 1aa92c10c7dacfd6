use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    serve, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::config::WidgetConfig;
use crate::endpoint::ChatEndpointClient;
use crate::session::UiEvent;
use crate::view::ServerMessage;
use crate::widget::ChatWidget;

/// Where the page and its assets are served from.
#[derive(clap::Args, Debug, Clone)]
pub struct ServerOptions {
    #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
    pub port: u16,
    #[arg(long, default_value = "templates", help = "Directory holding index.html.")]
    pub templates: PathBuf,
    #[arg(long = "static", default_value = "static", help = "Directory served under /static.")]
    pub static_dir: PathBuf,
}

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    widget: Arc<WidgetConfig>,
    client: ChatEndpointClient,
    live_sessions: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(widget: WidgetConfig, templates_dir: &Path) -> Result<Self> {
        let client = ChatEndpointClient::from_config(&widget)
            .context("Failed to build chat endpoint client")?;
        Ok(Self {
            templates: Arc::new(create_minijinja_env(templates_dir)),
            widget: Arc::new(widget),
            client,
            live_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of WebSocket sessions currently open.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }
}

fn create_minijinja_env(dir: &Path) -> AutoReloader {
    let dir = dir.to_path_buf();
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&dir));
        notifier.watch_path(&dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "Chat Widget",
                    endpoint_url => state.widget.endpoint_url.as_str(),
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

// One connection is one widget session.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let live = state.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
    info!(live, "New chat session connected");
    let (mut sender, mut receiver) = socket.split();
    let (event_tx, event_rx) = mpsc::channel::<UiEvent>(32);
    let (view_tx, mut view_rx) = mpsc::channel(32);

    let widget = ChatWidget::new(&state.widget, state.client.clone());
    let session = tokio::spawn(widget.run(event_rx, view_tx));

    loop {
        tokio::select! {
            view = view_rx.recv() => {
                let Some(view) = view else {
                    warn!("Session ended unexpectedly");
                    break;
                };
                match serde_json::to_string(&ServerMessage::View(view)) {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            warn!("WebSocket send failed, closing session");
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize view: {}", e),
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<UiEvent>(&text) {
                        Ok(event) => {
                            debug!(?event, "UI event");
                            if event_tx.send(event).await.is_err() {
                                warn!("Session ended unexpectedly");
                                break;
                            }
                        }
                        Err(e) => warn!("Ignoring malformed UI event {:?}: {}", text, e),
                    },
                    Some(Ok(Message::Binary(_))) => warn!("Received unexpected binary message from client"),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested WebSocket close");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket receive failed: {}", e);
                        break;
                    }
                    // Client disconnected without sending a Close message
                    None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                }
            }
        }
    }

    // Closing both channels ends the session task even if it is mid-send.
    drop(event_tx);
    drop(view_rx);
    if let Err(e) = session.await {
        error!("Session task failed: {:?}", e);
    }
    let live = state.live_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
    info!(live, "Chat session disconnected");
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    let static_files_service = ServeDir::new(static_dir).not_found_service(tower::service_fn(|_| async {
        Ok::<Response, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
    }));

    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

pub async fn start_web_server(widget: WidgetConfig, options: ServerOptions) -> Result<()> {
    info!(endpoint = %widget.endpoint_url, "Chat requests go to the configured endpoint");
    let state = AppState::new(widget, &options.templates)?;
    let app = router(state, &options.static_dir);

    let addr = SocketAddr::from(([127, 0, 0, 1], options.port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
