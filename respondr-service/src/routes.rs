use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use respondr_core::{
    AnalysisResponse, ChatResponse, CoreError, IncidentRunner, Session, TextSignal, VideoSignal,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analyzers::{MediaInput, VideoAnalyzer, resolve_video_signal};
use crate::config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub runner: IncidentRunner,
    pub analyzer: Arc<dyn VideoAnalyzer>,
    pub config: Arc<ServiceConfig>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub session_id: Option<String>,
    pub media_ref: Option<String>,
    pub scene_description: Option<String>,
    #[serde(default)]
    pub note: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub video_analysis: VideoSignal,
    pub text_analysis: TextSignal,
    pub analysis: AnalysisResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn core_error(session_id: &str, err: CoreError) -> ApiError {
    match err {
        CoreError::InvalidSession(_) => {
            warn!(session_id = %session_id, "follow-up without a prior analysis");
            api_error(
                StatusCode::CONFLICT,
                "No accident analysis found for this session. Please start a new analysis.",
            )
        }
        CoreError::SessionStore(e) => {
            error!(session_id = %session_id, error = %e, "session store failure");
            internal_error("Failed to access session")
        }
    }
}

fn validate_session_id(session_id: &str) -> Result<(), ApiError> {
    if Uuid::parse_str(session_id).is_err() {
        error!(session_id = %session_id, "Invalid session ID format");
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid session ID format"));
    }
    Ok(())
}

fn resolve_location(requested: Option<&str>, config: &ServiceConfig) -> String {
    requested
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(config.default_location.as_str())
        .to_string()
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Respondr backend running",
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let session_id = match request.session_id {
        Some(id) => {
            validate_session_id(&id)?;
            id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            info!(session_id = %id, "Creating new session");
            id
        }
    };
    let location = resolve_location(request.location.as_deref(), &state.config);

    info!(
        session_id = %session_id,
        analyzer = state.analyzer.name(),
        note_length = request.note.len(),
        location = %location,
        "Processing analyze request"
    );

    let media = MediaInput {
        media_ref: request.media_ref,
        scene_description: request.scene_description,
    };
    let video = resolve_video_signal(
        state.analyzer.as_ref(),
        &media,
        state.config.analyzer_timeout,
    )
    .await;
    let text = TextSignal::from_note(request.note);

    let analysis = state
        .runner
        .analyze(&session_id, &video, &text, &location)
        .map_err(|e| core_error(&session_id, e))?;

    Ok(Json(AnalyzeResponse {
        session_id,
        video_analysis: video,
        text_analysis: text,
        analysis,
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    validate_session_id(&request.session_id)?;
    let location = resolve_location(request.location.as_deref(), &state.config);

    info!(
        session_id = %request.session_id,
        message_length = request.message.len(),
        "Processing chat request"
    );

    let response = state
        .runner
        .chat(&request.session_id, &request.message, &location)
        .map_err(|e| core_error(&request.session_id, e))?;

    Ok(Json(response))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    info!(session_id = %session_id, "Getting session");

    match state.runner.sessions().get(&session_id) {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => {
            info!(session_id = %session_id, "Session not found");
            Err(api_error(StatusCode::NOT_FOUND, "Session not found"))
        }
        Err(e) => Err(core_error(&session_id, e)),
    }
}
