//! WebSocket push channel
//!
//! Each connected client gets a text frame `leaderboardUpdate` after every
//! write. Frames carry no data; clients refetch over REST.

use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use engine::LeaderboardEvent;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before the upgrade completes so no write after the handshake is missed
    let updates = state.service.subscribe();
    ws.on_upgrade(move |socket| client_session(socket, updates))
}

async fn client_session(socket: WebSocket, mut updates: Receiver<LeaderboardEvent>) {
    info!("Client connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = next_refresh(&mut updates) => {
                let Some(event) = update else { break };
                if sender.send(Message::Text(event.name().to_string())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Pings are answered by the websocket layer; clients have nothing else to say
                Some(Ok(_)) => {}
            },
        }
    }

    info!("Client disconnected");
}

/// Next event to push, or `None` once the notifier is gone.
/// A lagging receiver is drained so the whole backlog becomes one refresh.
async fn next_refresh(updates: &mut Receiver<LeaderboardEvent>) -> Option<LeaderboardEvent> {
    match updates.recv().await {
        Ok(event) => Some(event),
        Err(RecvError::Lagged(skipped)) => {
            let mut drained = 0usize;
            loop {
                match updates.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => drained += 1,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
            debug!(skipped, drained, "Client lagging, collapsing refreshes");
            Some(LeaderboardEvent::Refresh)
        }
        Err(RecvError::Closed) => None,
    }
}
