//! REST API endpoints
//!
//! Every UI action becomes a [`ControlEvent`] for the session task. Handlers
//! never touch calibration or loop state directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::animation::{ControlEvent, LoopOption};
use crate::output::broadcast::StatusSnapshot;
use crate::output::sse;
use crate::params::ControlParam;
use crate::AppState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
    pub version: String,
}

/// Get current status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ApiResponse::success(StatusResponse {
        snapshot: state.snapshot(),
        version: crate::VERSION.to_string(),
    })
}

/// Get current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read().await;
    Json(config.clone())
}

/// Queue an event, reporting a stopped session as unavailable
async fn dispatch(state: &AppState, event: ControlEvent) -> Response {
    match state.send_event(event).await {
        Ok(()) => ApiResponse::ok().into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, ApiResponse::error(&e.to_string())).into_response(),
    }
}

fn bad_request(message: &str) -> Response {
    warn!("Ignoring request: {}", message);
    (StatusCode::BAD_REQUEST, ApiResponse::error(message)).into_response()
}

pub async fn advance_calibration(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, ControlEvent::AdvanceCalibration).await
}

#[derive(Debug, Deserialize)]
pub struct OptionRequest {
    pub option: String,
    pub enabled: bool,
}

pub async fn set_option(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptionRequest>,
) -> Response {
    match request.option.parse::<LoopOption>() {
        Ok(option) => {
            dispatch(
                &state,
                ControlEvent::SetOption {
                    option,
                    enabled: request.enabled,
                },
            )
            .await
        }
        Err(e) => bad_request(&e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub name: String,
    pub value: f32,
}

/// Set a slider override. Values are clamped to the control's range.
pub async fn set_override(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OverrideRequest>,
) -> Response {
    match request.name.parse::<ControlParam>() {
        Ok(param) if request.value.is_finite() => {
            dispatch(
                &state,
                ControlEvent::SetOverride {
                    param,
                    value: param.clamp_value(request.value),
                },
            )
            .await
        }
        Ok(param) => bad_request(&format!("Value for {} must be finite", param)),
        Err(e) => bad_request(&e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClearOverrideRequest {
    pub name: String,
}

pub async fn clear_override(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClearOverrideRequest>,
) -> Response {
    match request.name.parse::<ControlParam>() {
        Ok(param) => dispatch(&state, ControlEvent::ClearOverride(param)).await,
        Err(e) => bad_request(&e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub focused: bool,
}

pub async fn set_focus(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FocusRequest>,
) -> Response {
    let event = if request.focused {
        ControlEvent::FocusGained
    } else {
        ControlEvent::FocusLost
    };
    dispatch(&state, event).await
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, ControlEvent::Pause).await
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, ControlEvent::Resume).await
}

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub name: String,
}

/// Swap the avatar model. Load failures are reported on the status stream.
pub async fn set_model(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModelRequest>,
) -> Response {
    if request.name.trim().is_empty() {
        return bad_request("Model name must not be empty");
    }
    dispatch(&state, ControlEvent::SwapModel(request.name)).await
}

/// SSE stream of parameters, model announcements and status
pub async fn event_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_stream(state)
}
