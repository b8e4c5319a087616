use serde::Deserialize;

use super::action::ActionInContext;
use super::journey::Journey;
use crate::codegen::GeneratorOptions;

#[derive(Debug, Deserialize, Default)]
pub struct StartRecordingRequest {
    /// Optional journey name - falls back to the configured default
    pub name: Option<String>,
    /// Optional client ID for tracking which client started the recording
    /// Used for cleanup when client disconnects
    pub client_id: Option<String>,
}

/// Stateless generation from an already coalesced action list
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub actions: Vec<ActionInContext>,
    #[serde(default)]
    pub options: Option<GeneratorOptions>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateJourneyRequest {
    pub journey: Journey,
    #[serde(default)]
    pub options: Option<GeneratorOptions>,
}
