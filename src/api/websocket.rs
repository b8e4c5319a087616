use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::state::{AppState, WsEvent};
use crate::recording::ActionChange;

#[derive(Debug, Deserialize)]
struct WsIncoming {
    #[serde(rename = "type")]
    msg_type: String,
}

#[derive(Debug, Serialize)]
struct WsOutgoing {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    journey: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WsOutgoing {
    fn new(msg_type: &str, session_id: Option<String>) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            session_id,
            index: None,
            action: None,
            journey: None,
            error: None,
        }
    }
}

impl From<WsEvent> for WsOutgoing {
    fn from(event: WsEvent) -> Self {
        match event {
            WsEvent::ActionChanged {
                session_id,
                change: ActionChange::Added { index, action },
            } => WsOutgoing {
                index: Some(index),
                action: serde_json::to_value(&action).ok(),
                ..WsOutgoing::new("action_added", Some(session_id))
            },
            WsEvent::ActionChanged {
                session_id,
                change: ActionChange::Removed { index },
            } => WsOutgoing {
                index: Some(index),
                ..WsOutgoing::new("action_removed", Some(session_id))
            },
            WsEvent::RecordingStopped {
                session_id,
                journey,
            } => WsOutgoing {
                journey: serde_json::to_value(&journey).ok(),
                ..WsOutgoing::new("recording_stopped", Some(session_id))
            },
            WsEvent::Error { session_id, error } => WsOutgoing {
                error: Some(error),
                ..WsOutgoing::new("error", Some(session_id))
            },
            WsEvent::Pong => WsOutgoing::new("pong", None),
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request from client: {}", client_id);
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    tracing::info!("WebSocket connected: {}", client_id);
    state.client_connected(&client_id);

    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast events
    let mut rx = state.subscribe();

    // Task to forward broadcast events to this client
    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = match serde_json::to_string(&WsOutgoing::from(event)) {
                Ok(j) => j,
                Err(_) => continue,
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Task to handle incoming messages (ping/pong)
    let state_clone = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(incoming) = serde_json::from_str::<WsIncoming>(&text) {
                    if incoming.msg_type == "ping" {
                        state_clone.broadcast(WsEvent::Pong);
                    }
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.client_disconnected(&client_id);
    tracing::info!("WebSocket disconnected: {}", client_id);
}
