// src/api.rs
use std::path::PathBuf;
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::podcast::pipeline::{Pipeline, RegenerateError};
use crate::podcast::{is_safe_component, PodcastListing};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    frontend_dir: PathBuf,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, frontend_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            frontend_dir: frontend_dir.into(),
        }
    }
}

/// Error body: `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<RegenerateError> for ApiError {
    fn from(e: RegenerateError) -> Self {
        let status = match e {
            RegenerateError::MissingParameters | RegenerateError::InvalidPath => {
                StatusCode::BAD_REQUEST
            }
            RegenerateError::TranscriptNotFound => StatusCode::NOT_FOUND,
            RegenerateError::NoAudio | RegenerateError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    let index = ServeFile::new(state.frontend_dir.join("index.html"));
    let podcasts = ServeDir::new(state.pipeline.library().root());

    Router::new()
        .route_service("/", index)
        .route("/health", get(|| async { "OK" }))
        .route("/api/podcasts", get(list_podcasts))
        .route("/api/transcript/{category}/{filename}", get(transcript))
        .route("/api/regenerate_podcast", post(regenerate_podcast))
        .nest_service("/podcasts", podcasts)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn list_podcasts(State(state): State<AppState>) -> Result<Json<PodcastListing>, ApiError> {
    state.pipeline.library().list().map(Json).map_err(|e| {
        tracing::error!(error = ?e, "error listing podcasts");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not read podcast directory",
        )
    })
}

#[derive(serde::Serialize)]
struct TranscriptResp {
    transcript: String,
}

async fn transcript(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Json<TranscriptResp>, ApiError> {
    if !is_safe_component(&category) || !is_safe_component(&filename) {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "Transcript not found"));
    }
    match state.pipeline.library().read_transcript(&category, &filename) {
        Ok(Some(transcript)) => Ok(Json(TranscriptResp { transcript })),
        Ok(None) => Err(ApiError::new(StatusCode::NOT_FOUND, "Transcript not found")),
        Err(e) => {
            tracing::error!(error = ?e, "error serving transcript");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not read transcript file",
            ))
        }
    }
}

/// Every field optional so absent and empty values get the same 400.
#[derive(serde::Deserialize, Default)]
struct RegenerateReq {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    voice_key: Option<String>,
}

#[derive(serde::Serialize)]
struct RegenerateResp {
    success: bool,
    message: String,
    new_audio_url: String,
}

async fn regenerate_podcast(
    State(state): State<AppState>,
    body: Option<Json<RegenerateReq>>,
) -> Result<Json<RegenerateResp>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let field = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
    let (category, filename, voice_key) = (
        field(req.category),
        field(req.filename),
        field(req.voice_key),
    );

    let done = state
        .pipeline
        .regenerate(&category, &filename, &voice_key)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, %category, %filename, "regeneration failed"))?;

    Ok(Json(RegenerateResp {
        success: true,
        message: format!("Podcast regenerated with {}.", done.voice_key),
        new_audio_url: done.new_audio_url,
    }))
}
