//! HTTP routes for the restyle server.
//!
//! - `GET  /`                   landing page
//! - `GET  /app`                application page
//! - `GET  /static/app.js`      application script
//! - `GET  /health`             `{"status": "ok", "version": ...}`
//! - `POST /analyze_transcript` learn a style profile from `video_link`
//! - `POST /generate_script`    write a script on `topic` for the session
//!
//! Sessions travel in the `x-session-id` header. Analyze mints one when the
//! request carries none and echoes it back in the body and the header.

use std::sync::Arc;

use axum::{
    Form, Json, Router, async_trait,
    extract::{FromRequest, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use restyle_core::session::{ProfileStore, SessionId};
use restyle_core::studio::Studio;
use restyle_core::{AnalyzeError, GenerateError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;

pub const SESSION_HEADER: &str = "x-session-id";

const LANDING_HTML: &str = include_str!("../assets/landing.html");
const APP_HTML: &str = include_str!("../assets/app.html");
const APP_JS: &str = include_str!("../assets/app.js");

const INVALID_LINK: &str = "Invalid YouTube video link.";
const TRANSCRIPT_FAILED: &str =
    "Failed to fetch the transcript. Please make sure the video has captions available.";
const ANALYSIS_FAILED: &str = "Failed to analyze the transcript. Please try again later.";
const EXTRACTION_FAILED: &str = "Failed to extract key insights from the analysis.";
const ANALYSIS_MISSING: &str = "Transcript analysis not completed. Please start over.";
const GENERATION_FAILED: &str = "Failed to generate the video script.";

#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
    pub profiles: Arc<ProfileStore>,
}

impl AppState {
    pub fn new(studio: Studio, profiles: ProfileStore) -> Self {
        Self {
            studio: Arc::new(studio),
            profiles: Arc::new(profiles),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/app", get(app_handler))
        .route("/static/app.js", get(app_script_handler))
        .route("/health", get(health_handler))
        .route("/analyze_transcript", post(analyze_handler))
        .route("/generate_script", post(generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Client-facing failure. The message is the whole response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::InvalidLink(_) => ApiError::BadRequest(INVALID_LINK.into()),
            AnalyzeError::Transcript(_) => ApiError::BadRequest(TRANSCRIPT_FAILED.into()),
            AnalyzeError::Provider(_) => ApiError::Internal(ANALYSIS_FAILED.into()),
            AnalyzeError::Extraction(_) => ApiError::Internal(EXTRACTION_FAILED.into()),
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::AnalysisMissing => ApiError::BadRequest(ANALYSIS_MISSING.into()),
            GenerateError::Provider(_) | GenerateError::EmptyScript => {
                ApiError::Internal(GENERATION_FAILED.into())
            }
        }
    }
}

/// Request body accepted as JSON or as an urlencoded form.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    video_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    topic: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Missing field: {name}")))
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(SessionId::parse)
}

async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_HTML)
}

async fn app_handler() -> Html<&'static str> {
    Html(APP_HTML)
}

async fn app_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": restyle_core::version(),
    }))
}

async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(body): Payload<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_link = required(body.video_link, "video_link")?;
    let session = session_from_headers(&headers).unwrap_or_default();

    let studio = state.studio.clone();
    let profile = tokio::task::spawn_blocking(move || studio.analyze(&video_link))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "analyze task failed");
            ApiError::Internal(ANALYSIS_FAILED.into())
        })??;

    let fields = profile.len();
    if state.profiles.store(session, profile).is_some() {
        tracing::debug!(%session, "replaced style profile");
    }
    tracing::info!(%session, fields, "analysis stored");

    let session_id = session.to_string();
    Ok((
        [(SESSION_HEADER, session_id.clone())],
        Json(json!({ "success": true, "session_id": session_id })),
    ))
}

async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(body): Payload<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = required(body.topic, "topic")?;
    let session = session_from_headers(&headers);
    let profile = state.profiles.require(session.as_ref()).inspect_err(|_| {
        tracing::warn!(session = ?session, "generate requested before analysis");
    })?;

    let studio = state.studio.clone();
    let script = tokio::task::spawn_blocking(move || studio.generate(&profile, &topic))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "generate task failed");
            ApiError::Internal(GENERATION_FAILED.into())
        })??;

    Ok(Json(json!({ "script": script })))
}
