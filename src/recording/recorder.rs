use tokio::sync::{broadcast, Mutex};

use crate::codegen::{CodeGenerator, GeneratorOptions};
use crate::error::{AppError, Result};
use crate::models::{ActionInContext, Journey, RecordingSession, Step};

use super::coalescer::ActionChange;

/// Owns one recording session and fans out its add/remove notifications.
///
/// The driver delivers events one at a time; the session lock serializes them
/// so each merge decision runs to completion before the next starts.
pub struct SessionRecorder {
    session: Mutex<Option<RecordingSession>>,
    change_sender: broadcast::Sender<ActionChange>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(256);

        Self {
            session: Mutex::new(None),
            change_sender: change_tx,
        }
    }

    /// Start a new recording session
    pub async fn start(&self, name: &str) -> Result<RecordingSession> {
        let mut session_guard = self.session.lock().await;
        if let Some(existing) = session_guard.as_ref().filter(|s| s.is_active()) {
            return Err(AppError::RecordingError(format!(
                "Session {} is already {}",
                existing.id,
                existing.status.as_str()
            )));
        }

        let mut session = RecordingSession::new(name.to_string());
        session.start();
        tracing::info!("Recording session {} started: {}", session.id, session.name);

        *session_guard = Some(session.clone());
        Ok(session)
    }

    /// Feed one driver event, returning the changes it caused
    pub async fn record(&self, event: ActionInContext) -> Result<Vec<ActionChange>> {
        let mut session_guard = self.session.lock().await;
        let session = session_guard
            .as_mut()
            .ok_or_else(|| AppError::RecordingError("No active recording session".to_string()))?;

        let changes = match session.record(event) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!("Rejected event for session {}: {}", session.id, e);
                return Err(e);
            }
        };

        // Sent under the session lock so subscribers see changes in fold order
        for change in &changes {
            // Ignore send errors (no subscribers)
            let _ = self.change_sender.send(change.clone());
        }
        Ok(changes)
    }

    /// Pause recording
    pub async fn pause(&self) -> Result<()> {
        let mut session_guard = self.session.lock().await;
        if let Some(ref mut session) = *session_guard {
            session.pause();
            tracing::info!("Recording paused");
        }
        Ok(())
    }

    /// Resume recording
    pub async fn resume(&self) -> Result<()> {
        let mut session_guard = self.session.lock().await;
        if let Some(ref mut session) = *session_guard {
            session.resume();
            tracing::info!("Recording resumed");
        }
        Ok(())
    }

    /// Stop recording and freeze the retained actions into a journey
    pub async fn stop(&self) -> Result<Journey> {
        let mut session_guard = self.session.lock().await;
        let mut session = session_guard
            .take()
            .ok_or_else(|| AppError::RecordingError("No active recording session".to_string()))?;
        drop(session_guard);

        session.complete();
        let actions = session.actions();
        let action_count = actions.len();

        let name = Some(session.name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let steps = match (&name, actions.is_empty()) {
            (_, true) => Vec::new(),
            (Some(name), false) => vec![Step::new(name.clone(), actions)],
            (None, false) => vec![Step::untitled(actions)],
        };
        let journey = Journey { name, steps };

        tracing::info!(
            "Recording stopped, session {} produced {} actions",
            session.id,
            action_count
        );

        Ok(journey)
    }

    /// Cancel recording without keeping any actions
    pub async fn cancel(&self) -> Result<()> {
        let mut session_guard = self.session.lock().await;
        if let Some(ref mut session) = *session_guard {
            session.cancel();
            tracing::info!("Recording session {} cancelled", session.id);
        }
        *session_guard = None;

        Ok(())
    }

    /// Get the current session
    pub async fn session(&self) -> Option<RecordingSession> {
        self.session.lock().await.clone()
    }

    /// Number of retained actions
    pub async fn action_count(&self) -> usize {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.action_count())
            .unwrap_or(0)
    }

    /// Generate code for everything retained so far
    pub async fn preview(&self, options: &GeneratorOptions) -> Result<String> {
        let actions = self
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| s.actions())
            .unwrap_or_default();

        CodeGenerator::new(options.clone())?.generate(&actions)
    }

    /// Subscribe to add/remove notifications
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ActionChange> {
        self.change_sender.subscribe()
    }
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, SessionStatus};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let recorder = SessionRecorder::new();
        recorder.start("first").await.unwrap();
        assert!(matches!(
            recorder.start("second").await,
            Err(AppError::RecordingError(_))
        ));
    }

    #[tokio::test]
    async fn test_record_without_session() {
        let recorder = SessionRecorder::new();
        let result = recorder
            .record(ActionInContext::new("page", Action::click("#a")))
            .await;
        assert!(matches!(result, Err(AppError::RecordingError(_))));
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let recorder = SessionRecorder::new();
        let mut changes = recorder.subscribe_changes();
        recorder.start("search").await.unwrap();

        recorder
            .record(ActionInContext::new("page", Action::fill("#q", "s")))
            .await
            .unwrap();
        recorder
            .record(ActionInContext::new("page", Action::fill("#q", "sh")))
            .await
            .unwrap();

        assert!(matches!(changes.recv().await.unwrap(), ActionChange::Added { index: 0, .. }));
        assert_eq!(changes.recv().await.unwrap(), ActionChange::Removed { index: 0 });
        assert!(matches!(changes.recv().await.unwrap(), ActionChange::Added { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_blank_name_uses_untitled_step() {
        let recorder = SessionRecorder::new();
        recorder.start("  ").await.unwrap();
        recorder
            .record(ActionInContext::new("page", Action::navigate("https://shop.test")))
            .await
            .unwrap();

        let journey = recorder.stop().await.unwrap();
        assert_eq!(journey.name, None);
        assert_eq!(journey.steps.len(), 1);
        assert_eq!(journey.steps[0].name, "Navigate to https://shop.test");
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_notification_order() {
        let recorder = Arc::new(SessionRecorder::new());
        let mut changes = recorder.subscribe_changes();
        recorder.start("race").await.unwrap();

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    for round in 0..25 {
                        let text = format!("{}-{}", writer, round);
                        recorder
                            .record(ActionInContext::new(
                                &format!("page{}", writer % 2),
                                Action::fill("#q", &text),
                            ))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut mirror: Vec<ActionInContext> = Vec::new();
        while let Ok(change) = changes.try_recv() {
            match change {
                ActionChange::Added { index, action } => mirror.insert(index, action),
                ActionChange::Removed { index } => {
                    mirror.remove(index);
                }
            }
        }
        assert_eq!(mirror, recorder.session().await.unwrap().actions());
    }

    #[tokio::test]
    async fn test_cancel_clears_session() {
        let recorder = SessionRecorder::new();
        recorder.start("x").await.unwrap();
        recorder.cancel().await.unwrap();
        assert!(recorder.session().await.is_none());
        assert!(recorder.stop().await.is_err());
    }

    #[tokio::test]
    async fn test_pause_keeps_status() {
        let recorder = SessionRecorder::new();
        recorder.start("x").await.unwrap();
        recorder.pause().await.unwrap();
        let session = recorder.session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Paused);
    }
}
