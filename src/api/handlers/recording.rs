use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::codegen::{CodeGenerator, GeneratorOptions};
use crate::error::Result;
use crate::models::{
    ActionInContext, ActionsResponse, CodeResponse, GenericResponse, RecordActionResponse,
    SessionStatusResponse, StartRecordingRequest, StartRecordingResponse, StopRecordingResponse,
};
use crate::recording::SessionRecorder;

use super::super::state::{ActiveRecorder, AppState, WsEvent};

/// Start a new recording session
///
/// Add/remove notifications of the session are forwarded to WebSocket clients.
pub async fn start_recording(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRecordingRequest>,
) -> Result<Json<StartRecordingResponse>> {
    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| state.config.journey_name.clone());

    let recorder = Arc::new(SessionRecorder::new());
    let mut change_rx = recorder.subscribe_changes();
    let session = recorder.start(&name).await?;
    let session_id = session.id.clone();

    let ws_broadcast = state.ws_broadcast.clone();
    let sid = session_id.clone();
    tokio::spawn(async move {
        while let Ok(change) = change_rx.recv().await {
            let _ = ws_broadcast.send(WsEvent::ActionChanged {
                session_id: sid.clone(),
                change,
            });
        }
    });

    state.recordings.insert(
        session_id.clone(),
        ActiveRecorder {
            recorder,
            client_id: request.client_id,
        },
    );

    tracing::info!("Created recording session {} ({})", session_id, name);

    Ok(Json(StartRecordingResponse {
        session_id,
        status: session.status.as_str().to_string(),
    }))
}

/// Feed one driver event into a session
///
/// The body is decoded here rather than by the `Json` extractor so malformed
/// events surface as `MalformedAction`.
pub async fn record_action(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    body: String,
) -> Result<Json<RecordActionResponse>> {
    let recorder = state.recorder(&session_id)?;

    let event = match ActionInContext::from_json(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Malformed event for session {}: {}", session_id, e);
            state.broadcast(WsEvent::Error {
                session_id: session_id.clone(),
                error: e.to_string(),
            });
            return Err(e);
        }
    };

    let changes = recorder.record(event).await?;
    let action_count = recorder.action_count().await;

    Ok(Json(RecordActionResponse {
        changes,
        action_count,
    }))
}

pub async fn pause_recording(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<GenericResponse>> {
    state.recorder(&session_id)?.pause().await?;
    Ok(Json(GenericResponse {
        status: "paused".to_string(),
    }))
}

pub async fn resume_recording(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<GenericResponse>> {
    state.recorder(&session_id)?.resume().await?;
    Ok(Json(GenericResponse {
        status: "recording".to_string(),
    }))
}

/// Stop a session and generate the final script
pub async fn stop_recording(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<StopRecordingResponse>> {
    let recorder = state.recorder(&session_id)?;
    let journey = recorder.stop().await?;
    state.recordings.remove(&session_id);

    let options = GeneratorOptions {
        journey_name: journey
            .name
            .clone()
            .unwrap_or_else(|| state.config.journey_name.clone()),
        ..state.generator_options(None)
    };
    let actions: Vec<ActionInContext> = journey.actions().cloned().collect();
    let code = CodeGenerator::new(options)?.generate(&actions)?;

    tracing::info!(
        "Stopped recording session {} with {} actions",
        session_id,
        actions.len()
    );

    state.broadcast(WsEvent::RecordingStopped {
        session_id,
        journey: journey.clone(),
    });

    Ok(Json(StopRecordingResponse { journey, code }))
}

/// Cancel a recording session without saving
pub async fn cancel_recording(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<GenericResponse>> {
    let recorder = state.recorder(&session_id)?;
    recorder.cancel().await?;
    state.recordings.remove(&session_id);

    tracing::info!("Cancelled recording session {}", session_id);

    Ok(Json(GenericResponse {
        status: "cancelled".to_string(),
    }))
}

/// Get the status of a recording session
pub async fn get_recording_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>> {
    let recorder = state.recorder(&session_id)?;
    let session = recorder.session().await;

    Ok(Json(SessionStatusResponse {
        session_id,
        status: session
            .as_ref()
            .map(|s| s.status.as_str())
            .unwrap_or("cancelled")
            .to_string(),
        action_count: session.as_ref().map(|s| s.action_count()).unwrap_or(0),
        started_at: session
            .as_ref()
            .and_then(|s| s.started_at)
            .map(|t| t.to_rfc3339()),
    }))
}

/// Retained actions so far
pub async fn get_recording_actions(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ActionsResponse>> {
    let recorder = state.recorder(&session_id)?;
    let actions = recorder
        .session()
        .await
        .map(|s| s.actions())
        .unwrap_or_default();
    Ok(Json(ActionsResponse { actions }))
}

/// Live preview of the script for the current prefix
pub async fn get_recording_code(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<CodeResponse>> {
    let recorder = state.recorder(&session_id)?;
    let journey_name = recorder
        .session()
        .await
        .map(|s| s.name)
        .unwrap_or_else(|| state.config.journey_name.clone());

    let options = GeneratorOptions {
        journey_name,
        ..state.generator_options(None)
    };
    let code = recorder.preview(&options).await?;
    Ok(Json(CodeResponse { code }))
}
