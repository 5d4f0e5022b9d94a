//! HTTP bridge for an out-of-process client
//!
//! Exposes the recorder bridge as a REST API:
//! - POST /recorder/initialize, /recorder/start, /recorder/stop
//! - GET /recorder/status
//! - POST /telephony/call-state - Deliver a call state change
//! - POST /permissions/result - Deliver a permission request outcome
//! - POST /capture/frames - Push raw PCM into the open recording
//! - POST /monitor/start, /monitor/stop - Background monitoring
//! - POST /server/start, GET /server/status - Embedded server
//! - GET /events - Server-sent event stream
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
