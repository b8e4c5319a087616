use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

use crate::codegen::GeneratorOptions;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Journey;
use crate::recording::{ActionChange, SessionRecorder};

/// WebSocket event types broadcast to clients
#[derive(Debug, Clone)]
pub enum WsEvent {
    ActionChanged {
        session_id: String,
        change: ActionChange,
    },
    RecordingStopped {
        session_id: String,
        journey: Journey,
    },
    Error {
        session_id: String,
        error: String,
    },
    Pong,
}

/// Connected WebSocket client info
#[derive(Debug)]
pub struct ConnectedClient {
    pub connected_at: Instant,
}

/// Active recorder for one session
pub struct ActiveRecorder {
    pub recorder: Arc<SessionRecorder>,
    /// Optional client ID that started this recording
    pub client_id: Option<String>,
}

/// Shared application state
pub struct AppState {
    pub config: Config,

    /// Active recording sessions: session_id -> recorder
    pub recordings: DashMap<String, ActiveRecorder>,

    /// Connected WebSocket clients: client_id -> client info
    pub connected_clients: DashMap<String, ConnectedClient>,

    /// Total connection count (for metrics)
    connection_count: AtomicUsize,

    /// Broadcast channel for WebSocket events
    pub ws_broadcast: broadcast::Sender<WsEvent>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (tx, _) = broadcast::channel(1024);

        Self {
            config,
            recordings: DashMap::new(),
            connected_clients: DashMap::new(),
            connection_count: AtomicUsize::new(0),
            ws_broadcast: tx,
        }
    }

    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no receivers)
        let _ = self.ws_broadcast.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.ws_broadcast.subscribe()
    }

    /// Recorder for a session, cloned out so no map guard is held across awaits
    pub fn recorder(&self, session_id: &str) -> Result<Arc<SessionRecorder>> {
        self.recordings
            .get(session_id)
            .map(|active| Arc::clone(&active.recorder))
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    /// Request options, or the configured defaults
    pub fn generator_options(&self, requested: Option<GeneratorOptions>) -> GeneratorOptions {
        requested.unwrap_or_else(|| self.config.generator_options())
    }

    /// Register a WebSocket client connection
    pub fn client_connected(&self, client_id: &str) {
        self.connected_clients.insert(
            client_id.to_string(),
            ConnectedClient {
                connected_at: Instant::now(),
            },
        );
        let count = self.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "Client {} connected (total: {}, active: {})",
            client_id,
            count,
            self.connected_clients.len()
        );
    }

    /// Unregister a WebSocket client connection and drop recordings it started
    pub fn client_disconnected(&self, client_id: &str) {
        if let Some((_, client)) = self.connected_clients.remove(client_id) {
            let duration = client.connected_at.elapsed();
            tracing::debug!(
                "Client {} disconnected after {:?} (active: {})",
                client_id,
                duration,
                self.connected_clients.len()
            );
        }

        self.recordings.retain(|session_id, active_recorder| {
            let keep = active_recorder.client_id.as_deref() != Some(client_id);
            if !keep {
                tracing::info!("Cleaning up orphaned recording session: {}", session_id);
            }
            keep
        });
    }

    /// Get the number of active WebSocket connections
    pub fn active_connection_count(&self) -> usize {
        self.connected_clients.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_drops_owned_recordings() {
        let state = AppState::default();
        state.client_connected("ui-1");
        state.recordings.insert(
            "s1".to_string(),
            ActiveRecorder {
                recorder: Arc::new(SessionRecorder::new()),
                client_id: Some("ui-1".to_string()),
            },
        );
        state.recordings.insert(
            "s2".to_string(),
            ActiveRecorder {
                recorder: Arc::new(SessionRecorder::new()),
                client_id: None,
            },
        );

        assert_eq!(state.active_connection_count(), 1);
        state.client_disconnected("ui-1");

        assert_eq!(state.active_connection_count(), 0);
        assert!(state.recorder("s1").is_err());
        assert!(state.recorder("s2").is_ok());
    }
}
