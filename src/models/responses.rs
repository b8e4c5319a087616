use serde::Serialize;

use super::action::ActionInContext;
use super::journey::Journey;
use crate::recording::ActionChange;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_sessions: usize,
    pub connected_clients: usize,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RecordActionResponse {
    pub changes: Vec<ActionChange>,
    pub action_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub journey: Journey,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub status: String,
    pub action_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub actions: Vec<ActionInContext>,
}

#[derive(Debug, Serialize)]
pub struct GenericResponse {
    pub status: String,
}
