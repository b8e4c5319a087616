use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{codegen, health, recording};
use super::state::AppState;
use super::websocket::ws_handler;

const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:1420",
    "http://localhost:5173",
    "http://127.0.0.1:1420",
    "http://127.0.0.1:5173",
];

pub fn create_router(state: Arc<AppState>) -> Router {
    // Only local tooling talks to the recorder
    let cors = CorsLayer::new()
        .allow_origin(
            ALLOWED_ORIGINS
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Recording endpoints
        .route("/recording/start", post(recording::start_recording))
        .route(
            "/recording/:session_id/actions",
            post(recording::record_action).get(recording::get_recording_actions),
        )
        .route(
            "/recording/:session_id/pause",
            post(recording::pause_recording),
        )
        .route(
            "/recording/:session_id/resume",
            post(recording::resume_recording),
        )
        .route(
            "/recording/:session_id/stop",
            post(recording::stop_recording),
        )
        .route(
            "/recording/:session_id/cancel",
            post(recording::cancel_recording),
        )
        .route(
            "/recording/:session_id/status",
            get(recording::get_recording_status),
        )
        .route(
            "/recording/:session_id/code",
            get(recording::get_recording_code),
        )
        // Stateless code generation
        .route("/codegen", post(codegen::generate_code))
        .route("/codegen/journey", post(codegen::generate_journey_code))
        // WebSocket
        .route("/ws/:client_id", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
