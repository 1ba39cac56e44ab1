//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
};
use tracing::{debug, warn};

use crate::state::AppState;
use super::{
    break_page::BREAK_PAGE_HTML,
    messages::{ControlMessage, ControlReply},
    responses::{HealthResponse, StatusResponse},
};

/// Apply one control message to the controller
pub fn dispatch(state: &Arc<AppState>, message: ControlMessage) -> Result<ControlReply, String> {
    debug!("Control message received: {}", message.action());

    match message {
        ControlMessage::StartTimer { minutes } => {
            state.start_timer(minutes).map(|_| ControlReply::ok())
        }
        ControlMessage::PauseTimer { time_left } => {
            state.pause_timer(time_left).map(|_| ControlReply::ok())
        }
        ControlMessage::ResumeTimer => state.resume_timer().map(|_| ControlReply::ok()),
        ControlMessage::GetTimerState => Ok(ControlReply::TimerState(state.get_timer_state())),
    }
}

/// Handle POST /message - the popup's control channel
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ControlMessage>,
) -> (StatusCode, Json<ControlReply>) {
    let action = message.action();
    match dispatch(&state, message) {
        Ok(reply) => (StatusCode::OK, Json(reply)),
        Err(e) => {
            warn!("Rejected {} message: {}", action, e);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ControlReply::failed(e)))
        }
    }
}

/// Handle GET /status - Return current timer and session status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.get_timer_state(),
        session_type: state.session_type(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /break - The break surface
pub async fn break_handler() -> Html<&'static str> {
    Html(BREAK_PAGE_HTML)
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
