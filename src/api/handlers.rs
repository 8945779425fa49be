//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::{error, info};

use crate::state::AppState;
use crate::timer::TimerStateReply;

use super::responses::{CommandResponse, HealthResponse, StatusResponse};

/// Optional body for POST /timer/start
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Run length in milliseconds; server default when omitted
    pub duration: Option<i64>,
}

/// Handle POST /timer/start - start (or replace) the shared countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<CommandResponse>, StatusCode> {
    let duration = body.and_then(|Json(request)| request.duration);
    state.record_command("start");

    match state.timer.start(duration) {
        Ok(timer) => {
            info!("Start endpoint called: duration={}ms", timer.duration);
            Ok(Json(CommandResponse::new(
                "started",
                format!("Timer running for {}ms", timer.duration),
            )))
        }
        Err(e) => {
            error!("Failed to start timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/stop - stop the running countdown
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, StatusCode> {
    state.record_command("stop");

    match state.timer.stop() {
        Ok(true) => {
            info!("Stop endpoint called - timer stopped");
            Ok(Json(CommandResponse::new(
                "stopped",
                "Timer stopped".to_string(),
            )))
        }
        Ok(false) => Ok(Json(CommandResponse::new(
            "noop",
            "No timer running".to_string(),
        ))),
        Err(e) => {
            error!("Failed to stop timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/reset - clear the countdown unconditionally
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, StatusCode> {
    state.record_command("reset");

    match state.timer.reset() {
        Ok(()) => {
            info!("Reset endpoint called - timer cleared");
            Ok(Json(CommandResponse::new(
                "reset",
                "Timer cleared".to_string(),
            )))
        }
        Err(e) => {
            error!("Failed to reset timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /timer/state - current timer state for the requesting client
pub async fn timer_state_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerStateReply>, StatusCode> {
    match state.timer.query().await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            error!("Failed to query timer state: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - timer plus server metadata
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.timer.query().await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Failed to query timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_command, last_command_time) = state.get_last_command();

    Ok(Json(StatusResponse {
        timer,
        observers: state.timer.observer_count(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_command,
        last_command_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
