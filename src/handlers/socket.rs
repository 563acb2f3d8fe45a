//! WebSocket transport for the live feed.
//!
//! One task per connection multiplexes inbound frames and outbound hub
//! events. The session is closed explicitly when the loop ends so the
//! driver notification table never keeps a dead connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::{AppState, ClientSession};

#[derive(Debug, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SocketParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state, params.token))
}

async fn handle_connection(mut socket: WebSocket, state: Arc<AppState>, token: Option<String>) {
    let session = ClientSession::open(state.tracking.clone(), &state.credentials, token.as_deref());

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(subscription = %session.id(), error = %e, "Socket read failed");
                    break;
                }
            },
            event = session.next_event() => {
                let Some(event) = event else { break };
                match serde_json::to_string(&event) {
                    Ok(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to encode event"),
                }
            }
        }
    }

    session.close();
}
