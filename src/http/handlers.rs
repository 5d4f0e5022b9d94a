use super::state::AppState;
use crate::capture::AudioFrame;
use crate::error::BridgeRejection;
use crate::permissions::PermissionSet;
use crate::telephony::CallState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Resolved value of a deferred bridge call
#[derive(Debug, Serialize)]
pub struct Resolved<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct CallStateRequest {
    pub state: CallState,
}

#[derive(Debug, Deserialize)]
pub struct PermissionResultRequest {
    pub granted: bool,

    /// Exact grant state, if the host reports per-capability results
    pub permissions: Option<PermissionSet>,
}

#[derive(Debug, Serialize)]
pub struct FramesResponse {
    pub accepted: bool,
    pub samples: usize,
}

#[derive(Debug, Serialize)]
pub struct ServerStatusResponse {
    pub running: bool,
}

impl IntoResponse for BridgeRejection {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "PERMISSION_DENIED" => StatusCode::FORBIDDEN,
            "RECORDING_ERROR" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

fn resolved<T: Serialize>(result: T) -> Json<Resolved<T>> {
    Json(Resolved { result })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recorder/initialize
pub async fn initialize(State(state): State<AppState>) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(resolved(state.bridge.initialize().await?))
}

/// POST /recorder/start
pub async fn start_recording(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(resolved(state.bridge.start_recording().await?))
}

/// POST /recorder/stop
/// Resolves to the recording path, or null if nothing was recording
pub async fn stop_recording(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(resolved(state.bridge.stop_recording().await?))
}

/// GET /recorder/status
pub async fn recorder_status(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(Json(state.bridge.status().await?))
}

/// POST /telephony/call-state
pub async fn call_state_changed(
    State(state): State<AppState>,
    Json(req): Json<CallStateRequest>,
) -> Result<impl IntoResponse, BridgeRejection> {
    info!("Call state reported: {}", req.state);
    state.bridge.on_call_state_changed(req.state).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /permissions/result
pub async fn permission_result(
    State(state): State<AppState>,
    Json(req): Json<PermissionResultRequest>,
) -> Result<impl IntoResponse, BridgeRejection> {
    let granted = req.permissions.unwrap_or(if req.granted {
        PermissionSet::all_granted()
    } else {
        PermissionSet::default()
    });

    state.permissions.set(granted);
    state.bridge.on_permission_result(req.granted).await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /capture/frames
/// Body is raw 16-bit little-endian PCM in the configured format
pub async fn push_frames(State(state): State<AppState>, body: Bytes) -> Response {
    let frame = AudioFrame::from_le_bytes(&body, state.sample_rate, state.channels);
    let samples = frame.samples.len();

    match state.capture.push(frame).await {
        Ok(true) => (
            StatusCode::OK,
            Json(FramesResponse {
                accepted: true,
                samples,
            }),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(FramesResponse {
                accepted: false,
                samples: 0,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to push frames: {:#}", e);
            BridgeRejection::new("RECORDING_ERROR", e.to_string()).into_response()
        }
    }
}

/// POST /monitor/start
pub async fn start_monitor(State(state): State<AppState>) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(resolved(state.bridge.start_background_monitoring().await?))
}

/// POST /monitor/stop
pub async fn stop_monitor(State(state): State<AppState>) -> impl IntoResponse {
    resolved(state.bridge.stop_background_monitoring().await)
}

/// POST /server/start
pub async fn start_server(State(state): State<AppState>) -> Result<impl IntoResponse, BridgeRejection> {
    Ok(resolved(state.bridge.start_server().await?))
}

/// GET /server/status
pub async fn server_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServerStatusResponse {
        running: state.bridge.is_server_running(),
    })
}

/// GET /events
/// Server-sent stream of every emitted recorder event
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.bridge.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    let event = Event::default()
                        .event(envelope.event.name())
                        .json_data(&envelope);
                    return Some((event, rx));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
