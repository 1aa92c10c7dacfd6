use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::WidgetConfig;
use crate::endpoint::ChatEndpointClient;
use crate::error::NetworkError;
use crate::session::{ChatRequest, Effect, SessionState, UiEvent};
use crate::view::WidgetView;

/// A session wired to an endpoint client.
pub struct ChatWidget {
    session: SessionState,
    client: ChatEndpointClient,
    rng: StdRng,
}

impl ChatWidget {
    pub fn new(config: &WidgetConfig, client: ChatEndpointClient) -> Self {
        Self::with_rng(config, client, StdRng::from_os_rng())
    }

    pub fn with_rng(config: &WidgetConfig, client: ChatEndpointClient, rng: StdRng) -> Self {
        Self {
            session: SessionState::new(config.user_label.clone(), config.assistant_label.clone()),
            client,
            rng,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Apply one event and, if it issues a request, wait for the reply before
    /// returning. Nothing else can reach the session meanwhile.
    pub async fn dispatch(&mut self, event: UiEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        for effect in self.session.apply(event, &mut self.rng) {
            match effect {
                Effect::Send(request) => {
                    let outcome = self.client.send(&request.history, &request.message).await;
                    effects.extend(self.session.complete(&request, outcome));
                }
                other => effects.push(other),
            }
        }
        effects
    }

    /// Drive the session from a stream of events, publishing a fresh view after
    /// every change. Requests run on their own task so events keep flowing
    /// (and are ignored by the session) while a reply is pending. Returns when
    /// the event sender or the view receiver goes away.
    pub async fn run(mut self, mut events: mpsc::Receiver<UiEvent>, views: mpsc::Sender<WidgetView>) {
        let (done_tx, mut done_rx) = mpsc::channel::<(ChatRequest, Result<String, NetworkError>)>(4);

        if views.send(WidgetView::render(&self.session, &[])).await.is_err() {
            return;
        }

        loop {
            let effects = tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("Event stream closed, ending session");
                        break;
                    };
                    let effects = self.session.apply(event, &mut self.rng);
                    for effect in &effects {
                        if let Effect::Send(request) = effect {
                            spawn_request(self.client.clone(), request.clone(), done_tx.clone());
                        }
                    }
                    effects
                }
                Some((request, outcome)) = done_rx.recv() => {
                    self.session.complete(&request, outcome)
                }
            };

            if views.send(WidgetView::render(&self.session, &effects)).await.is_err() {
                debug!("View receiver closed, ending session");
                break;
            }
        }
        info!("Chat session finished");
    }
}

fn spawn_request(
    client: ChatEndpointClient,
    request: ChatRequest,
    done: mpsc::Sender<(ChatRequest, Result<String, NetworkError>)>,
) {
    tokio::spawn(async move {
        let outcome = client.send(&request.history, &request.message).await;
        // The session may be gone by now; nothing left to update then.
        let _ = done.send((request, outcome)).await;
    });
}
