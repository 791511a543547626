use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::realtime::{ClientMessage, ServerEvent};
use crate::state::AppState;
use crate::utils::error::AppError;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

type SocketWriter = SplitSink<WebSocket, Message>;

pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| client(socket, state))
}

/// Serves one dashboard connection until it closes.
///
/// The client gets the current event list first, then every broadcast frame.
/// Its own requests are applied through the shared event service.
async fn client(socket: WebSocket, state: AppState) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let (mut write, mut read) = socket.split();

    // Subscribe before the snapshot so no change falls between the two
    let mut updates = state.events.subscribe();
    info!(client_id, clients = state.hub.client_count(), "Client connected");

    let initial = ServerEvent::InitialEvents(state.events.all().await);
    if let Err(e) = send(&mut write, &initial).await {
        e.log();
        info!(client_id, "Client disconnected before initial sync");
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(event) => {
                    if let Err(e) = send(&mut write, &event).await {
                        e.log();
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(client_id, skipped, "Client lagged behind, frames dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_message(&state, client_id, &text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(client_id, error = %e, "Socket error");
                    break;
                }
            },
        }
    }

    info!(client_id, "Client disconnected");
}

async fn handle_message(state: &AppState, client_id: u64, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(client_id, error = %e, "Ignoring malformed client message");
            return;
        }
    };
    debug!(client_id, ?message, "Client message");

    if let Err(e) = dispatch(state, message).await {
        warn!(client_id, error = %e, "Client request failed");
    }
}

async fn dispatch(state: &AppState, message: ClientMessage) -> Result<(), AppError> {
    match message {
        ClientMessage::CreateEvent(draft) => state.events.create(draft).await.map(drop),
        ClientMessage::UpdateEvent(draft) => {
            let id = draft.id.ok_or_else(|| {
                AppError::ValidationError("updateEvent requires an event id".to_string())
            })?;
            state.events.update(id, draft).await.map(drop)
        }
        ClientMessage::DeleteEvent(id) => state.events.delete(id).await.map(drop),
    }
}

async fn send(write: &mut SocketWriter, event: &ServerEvent) -> Result<(), AppError> {
    let text = serde_json::to_string(event).map_err(|e| {
        AppError::InternalServerError(format!("failed to encode {}: {}", event.name(), e))
    })?;
    write
        .send(Message::Text(text))
        .await
        .map_err(|e| AppError::InternalServerError(format!("socket write failed: {}", e)))
}
