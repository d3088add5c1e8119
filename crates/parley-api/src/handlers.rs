//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, calls into the
//! vision or chat layer, and returns JSON.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use parley_backend::ImageInput;
use parley_chat::{ChatError, ChatMode, SessionView, TurnOutcome};
use parley_core::{AnalysisResult, ChatReply, ConversationHistory};

use crate::error::ApiError;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");
const APP_JS: &str = include_str!("../static/app.js");

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default: String,
}

/// Body for `POST /api/sessions`. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: ConversationHistory,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetModeResponse {
    pub mode: ChatMode,
    pub model: String,
    pub status: String,
}

// =============================================================================
// Multipart uploads
// =============================================================================

/// The fields of an `/analyze` or `/chat` form.
#[derive(Debug, Default)]
struct Upload {
    image: Option<ImageUpload>,
    message: Option<String>,
}

#[derive(Debug)]
struct ImageUpload {
    file_name: Option<String>,
    bytes: Bytes,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await?;
                    upload.image = Some(ImageUpload { file_name, bytes });
                }
                "message" => {
                    upload.message = Some(field.text().await?);
                }
                other => debug!(field = other, "Ignoring multipart field"),
            }
        }
        Ok(upload)
    }

    /// Decode the uploaded image. Missing, unnamed or empty uploads are
    /// rejected before any decoding is attempted.
    fn decode_image(&self) -> Result<ImageInput, ApiError> {
        let upload = self
            .image
            .as_ref()
            .ok_or_else(|| ApiError::BadRequest("No image uploaded".to_string()))?;

        if upload.file_name.as_deref() == Some("") || upload.bytes.is_empty() {
            return Err(ApiError::BadRequest("No image selected".to_string()));
        }

        info!(
            file_name = upload.file_name.as_deref().unwrap_or(""),
            size = upload.bytes.len(),
            "Processing image"
        );
        let image = ImageInput::decode(&upload.bytes)?;
        let (width, height) = image.dimensions();
        info!(width, height, "Image decoded successfully");
        Ok(image)
    }
}

// =============================================================================
// Vision endpoints
// =============================================================================

/// POST /analyze - structured description of an uploaded image.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    info!("Received analyze request");
    let upload = Upload::read(multipart?).await?;
    let image = upload.decode_image()?;

    let result = state.analyzer.analyze(&image).await?;
    info!("Analysis completed successfully");
    Ok(Json(result))
}

/// POST /chat - free-form question about an uploaded image.
pub async fn chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    info!("Received chat request");
    let upload = Upload::read(multipart?).await?;

    if upload.image.is_none() {
        return Err(ApiError::BadRequest("No image uploaded".to_string()));
    }
    let message = match upload.message.as_deref() {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => return Err(ApiError::BadRequest("No message provided".to_string())),
    };
    let image = upload.decode_image()?;

    let reply = state.analyzer.chat_about(&image, &message).await?;
    info!("Chat completed successfully");
    Ok(Json(reply))
}

// =============================================================================
// Text chat sessions
// =============================================================================

/// GET /api/models - local models offered for the text chat.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.models.as_ref().clone(),
        default: state.chat.default_model().to_string(),
    })
}

/// POST /api/sessions - start a conversation. An empty body uses defaults.
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let mode = match request.mode.as_deref() {
        Some(m) => m.parse::<ChatMode>()?,
        None => ChatMode::default(),
    };
    let model = match request.model.as_deref().map(str::trim) {
        Some("") => return Err(ChatError::EmptyModel.into()),
        Some(m) => m.to_string(),
        None => state.chat.default_model().to_string(),
    };

    let view = state.sessions.create(mode, model);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/{id} - current state of a conversation.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.sessions.get(id)?;
    let session = handle.lock().await;
    Ok(Json(session.view()))
}

/// POST /api/sessions/{id}/messages - submit one message.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let Json(request) = body?;
    let mut session = state.sessions.acquire(id)?;
    let outcome = state.chat.submit(&mut session, &request.message).await;
    Ok(Json(outcome))
}

/// PUT /api/sessions/{id}/mode - switch backend and optionally local model.
pub async fn set_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<SetModeRequest>, JsonRejection>,
) -> Result<Json<SetModeResponse>, ApiError> {
    let Json(request) = body?;
    let mode: ChatMode = request.mode.parse()?;

    let mut session = state.sessions.acquire(id)?;
    if let Some(model) = request.model.as_deref() {
        session.set_model(model)?;
    }
    let status = session.set_mode(mode);
    info!(session_id = %id, mode = %mode, model = %session.model, "Chat mode changed");

    Ok(Json(SetModeResponse {
        mode: session.mode,
        model: session.model.clone(),
        status: status.to_string(),
    }))
}

/// DELETE /api/sessions/{id}/history - forget every turn.
pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let mut session = state.sessions.acquire(id)?;
    session.clear();
    info!(session_id = %id, "Chat history cleared");
    Ok(Json(HistoryResponse {
        history: session.history.clone(),
    }))
}

/// DELETE /api/sessions/{id} - drop a conversation.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Health and static assets
// =============================================================================

/// GET /health - liveness and basic counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.sessions.len(),
    })
}

/// GET / - the browser UI.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /static/app.js
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}
