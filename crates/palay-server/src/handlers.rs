//! HTTP handlers: a thin pass-through over the engine control surface.
//!
//! Commands arrive as writes, the snapshot is a frequently-polled read.
//! No simulation logic lives here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use palay_engine::{ParamPatch, Snapshot};

use crate::state::AppState;

/// Standard acknowledgement for command endpoints.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

fn ok() -> Json<Ack> {
    Json(Ack { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub message: &'static str,
}

/// Engine control actions.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Start,
    StartInstant,
    Pause,
    Resume,
    Reset,
}

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub multiplier: f64,
}

pub async fn health() -> Json<Ack> {
    ok()
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "palay-server",
        message: "Backend is running",
    })
}

pub async fn snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    let engine = state.engine.lock().expect("engine mutex poisoned");
    Json(engine.snapshot())
}

pub async fn control(
    State(state): State<AppState>,
    Json(request): Json<ControlRequest>,
) -> Json<Ack> {
    debug!(action = ?request.action, "control command");
    let mut engine = state.engine.lock().expect("engine mutex poisoned");
    match request.action {
        ControlAction::Start => engine.start(),
        ControlAction::StartInstant => engine.start_instant(),
        ControlAction::Pause => engine.pause(),
        ControlAction::Resume => engine.resume(),
        ControlAction::Reset => engine.reset(),
    }
    ok()
}

pub async fn speed(State(state): State<AppState>, Json(request): Json<SpeedRequest>) -> Json<Ack> {
    let mut engine = state.engine.lock().expect("engine mutex poisoned");
    engine.set_speed(request.multiplier);
    ok()
}

pub async fn params(
    State(state): State<AppState>,
    Json(patch): Json<ParamPatch>,
) -> Result<Json<Ack>, Response> {
    if let Err(error) = patch.validate() {
        return Err((StatusCode::BAD_REQUEST, error.to_string()).into_response());
    }
    let mut engine = state.engine.lock().expect("engine mutex poisoned");
    engine.update_params(patch);
    Ok(ok())
}
