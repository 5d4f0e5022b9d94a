use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call recording
        .route("/recorder/initialize", post(handlers::initialize))
        .route("/recorder/start", post(handlers::start_recording))
        .route("/recorder/stop", post(handlers::stop_recording))
        .route("/recorder/status", get(handlers::recorder_status))
        // Host callbacks
        .route("/telephony/call-state", post(handlers::call_state_changed))
        .route("/permissions/result", post(handlers::permission_result))
        .route("/capture/frames", post(handlers::push_frames))
        // Background monitoring
        .route("/monitor/start", post(handlers::start_monitor))
        .route("/monitor/stop", post(handlers::stop_monitor))
        // Embedded server
        .route("/server/start", post(handlers::start_server))
        .route("/server/status", get(handlers::server_status))
        // Event stream
        .route("/events", get(handlers::event_stream))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
