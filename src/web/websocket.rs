//! WebSocket handler for real-time snapshot streaming.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::shared::{SimCommand, SimState, WorldSnapshot};

use super::state::AppState;

/// WebSocket message from server to client
#[derive(Serialize)]
#[serde(tag = "type")]
enum ServerMessage<'a> {
    /// World snapshot update
    Snapshot(&'a WorldSnapshot),
    /// Simulation state change
    StateChange { state: SimState },
}

/// WebSocket message from client to server
#[derive(Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    Pause,
    Resume,
    Step,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage<'_>) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            None
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    log::info!("WebSocket client connected");
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the latest snapshot so nothing is missed
    let mut snapshot_rx = state.subscribe_snapshots();

    // Task to send snapshots to client
    let send_state = state.clone();
    let send_task = tokio::spawn(async move {
        let current = ServerMessage::StateChange {
            state: send_state.get_state().await,
        };
        if let Some(msg) = encode(&current) {
            if sender.send(msg).await.is_err() {
                return;
            }
        }
        if let Some(snapshot) = send_state.latest_snapshot().await {
            if let Some(msg) = encode(&ServerMessage::Snapshot(&snapshot)) {
                if sender.send(msg).await.is_err() {
                    return;
                }
            }
        }

        loop {
            match snapshot_rx.recv().await {
                Ok(snapshot) => {
                    let Some(msg) = encode(&ServerMessage::Snapshot(&snapshot)) else {
                        continue;
                    };
                    if sender.send(msg).await.is_err() {
                        // Client disconnected
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    log::warn!("WebSocket client lagged, skipped {} snapshots", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Task to receive commands from client
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) else {
                        log::debug!("Ignoring unknown WebSocket message: {}", text);
                        continue;
                    };
                    let command = match msg {
                        ClientMessage::Pause => SimCommand::Pause,
                        ClientMessage::Resume => SimCommand::Resume,
                        ClientMessage::Step => SimCommand::Step,
                    };
                    recv_state.send_command(command).await;
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    log::error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete (client disconnect)
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    log::info!("WebSocket client disconnected");
}
