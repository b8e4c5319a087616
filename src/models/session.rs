use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::recording::{ActionChange, ActionCoalescer};

use super::action::ActionInContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Recording,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Recording => "recording",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub id: String,
    pub name: String,
    pub status: SessionStatus,
    #[serde(skip)]
    coalescer: ActionCoalescer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            status: SessionStatus::Pending,
            coalescer: ActionCoalescer::new(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = SessionStatus::Recording;
        self.started_at = Some(Utc::now());
    }

    pub fn pause(&mut self) {
        self.status = SessionStatus::Paused;
    }

    pub fn resume(&mut self) {
        self.status = SessionStatus::Recording;
    }

    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = SessionStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Recording | SessionStatus::Paused)
    }

    /// Feed one driver event through the coalescer.
    ///
    /// Events arriving while paused are ignored.
    pub fn record(&mut self, event: ActionInContext) -> Result<Vec<ActionChange>> {
        match self.status {
            SessionStatus::Recording => {}
            SessionStatus::Paused => {
                tracing::debug!("Session {} paused, ignoring {}", self.id, event.action.name());
                return Ok(Vec::new());
            }
            other => {
                return Err(AppError::RecordingError(format!(
                    "Session {} is {}",
                    self.id,
                    other.as_str()
                )));
            }
        }

        let outcome = self.coalescer.process(event)?;
        Ok(self.coalescer.changes(&outcome))
    }

    pub fn actions(&self) -> Vec<ActionInContext> {
        self.coalescer.snapshot()
    }

    pub fn action_count(&self) -> usize {
        self.coalescer.len()
    }
}
