//! Integration tests for the Parley HTTP API.
//!
//! Every test builds its own router over a scripted backend, so no model
//! server is needed. Requests go through `tower::ServiceExt::oneshot`.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use parley_api::handlers::{HealthResponse, ModelsResponse};
use parley_api::{create_router, AppState};
use parley_backend::{BackendError, ImageInput, ModelBackend};
use parley_core::prompt::ANALYSIS_PROMPT;
use parley_core::{BackendDescriptor, BackendKind, ParleyConfig};

// =============================================================================
// Helpers
// =============================================================================

const CANNED_ANALYSIS: &str =
    "Age: 20-25 years\nGender: Female\nClothing: red jacket\nEnvironment: outdoor, daytime";

/// What the scripted backend saw for one call.
#[derive(Debug, Clone)]
struct Seen {
    kind: BackendKind,
    model: String,
    prompt: String,
    image: Option<(u32, u32)>,
}

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedBackend {
    fn with(replies: Vec<Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn send(
        &self,
        backend: &BackendDescriptor,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, BackendError> {
        self.seen.lock().unwrap().push(Seen {
            kind: backend.kind,
            model: backend.model.clone(),
            prompt: prompt.to_string(),
            image: image.map(|i| i.dimensions()),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

fn make_state(backend: Arc<ScriptedBackend>) -> AppState {
    make_state_with(backend, ParleyConfig::default())
}

fn make_state_with(backend: Arc<ScriptedBackend>, config: ParleyConfig) -> AppState {
    AppState::new(
        config,
        backend,
        vec!["llama3.2".to_string(), "mistral".to_string()],
    )
}

fn make_app(backend: Arc<ScriptedBackend>) -> axum::Router {
    create_router(make_state(backend))
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

const BOUNDARY: &str = "parley-test-boundary";

enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create_session(app: &axum::Router, json: &str) -> Uuid {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/sessions", json))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    body["session_id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Pages and health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.sessions, 0);
}

#[tokio::test]
async fn test_index_page_served() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app.oneshot(empty_request("GET", "/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(html.contains("<title>Parley</title>"));
    assert!(html.contains("/static/app.js"));
}

#[tokio::test]
async fn test_script_served_as_javascript() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(empty_request("GET", "/static/app.js"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/javascript"));
}

// =============================================================================
// POST /analyze
// =============================================================================

#[tokio::test]
async fn test_analyze_returns_parsed_fields_in_order() {
    let backend = ScriptedBackend::with(vec![Ok(CANNED_ANALYSIS.to_string())]);
    let app = make_app(backend.clone());
    let png = png_bytes(64, 48);

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "person.png",
                bytes: &png,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    let expected = format!(
        r#"{{"age":"20-25 years","gender":"Female","clothing":"red jacket","environment":"outdoor, daytime","raw_response":{}}}"#,
        serde_json::to_string(CANNED_ANALYSIS).unwrap()
    );
    assert_eq!(body, expected);

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, BackendKind::OllamaVision);
    assert_eq!(seen[0].model, "llava:7b");
    assert_eq!(seen[0].prompt, ANALYSIS_PROMPT);
    assert_eq!(seen[0].image, Some((64, 48)));
}

#[tokio::test]
async fn test_analyze_unparseable_reply_gives_unknowns() {
    let backend = ScriptedBackend::with(vec![Ok("No person visible.".to_string())]);
    let app = make_app(backend);
    let png = png_bytes(8, 8);

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "empty-room.png",
                bytes: &png,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["age"], "Unknown");
    assert_eq!(body["environment"], "Unknown");
    assert_eq!(body["raw_response"], "No person visible.");
}

#[tokio::test]
async fn test_analyze_without_image_is_400() {
    let backend = ScriptedBackend::with(vec![]);
    let app = make_app(backend.clone());

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::Text {
                name: "note",
                value: "hello",
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No image uploaded");
    assert!(backend.seen().is_empty());
}

#[tokio::test]
async fn test_analyze_empty_file_is_400() {
    let app = make_app(ScriptedBackend::with(vec![]));

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "",
                bytes: &[],
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No image selected");
}

#[tokio::test]
async fn test_analyze_undecodable_image_is_400() {
    let backend = ScriptedBackend::with(vec![]);
    let app = make_app(backend.clone());

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "notes.txt",
                bytes: b"definitely not an image",
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Failed to decode image file"));
    assert!(backend.seen().is_empty());
}

#[tokio::test]
async fn test_analyze_backend_failure_is_500() {
    let backend = ScriptedBackend::with(vec![Err(BackendError::ConnectionFailed { attempts: 3 })]);
    let app = make_app(backend);
    let png = png_bytes(8, 8);

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "a.png",
                bytes: &png,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({"error": "API connection failed after 3 attempts"})
    );
}

#[tokio::test]
async fn test_analyze_format_failure_is_500() {
    let backend = ScriptedBackend::with(vec![Err(BackendError::UnexpectedContentType(
        "text/html".to_string(),
    ))]);
    let app = make_app(backend);
    let png = png_bytes(8, 8);

    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "a.png",
                bytes: &png,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await["error"],
        "Invalid API response format: text/html"
    );
}

#[tokio::test]
async fn test_analyze_not_multipart_is_400() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(json_request("POST", "/analyze", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn test_analyze_oversized_upload_is_413() {
    let backend = ScriptedBackend::with(vec![]);
    let mut config = ParleyConfig::default();
    config.server.max_upload_bytes = 1024;
    let app = create_router(make_state_with(backend.clone(), config));

    let big = vec![0u8; 8 * 1024];
    let resp = app
        .oneshot(multipart_request(
            "/analyze",
            &[Part::File {
                name: "image",
                filename: "huge.png",
                bytes: &big,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_json(resp).await["error"].is_string());
    assert!(backend.seen().is_empty());
}

// =============================================================================
// POST /chat
// =============================================================================

#[tokio::test]
async fn test_image_chat_happy_path() {
    let backend = ScriptedBackend::with(vec![Ok("She is wearing a red jacket.".to_string())]);
    let app = make_app(backend.clone());
    let png = png_bytes(16, 16);

    let resp = app
        .oneshot(multipart_request(
            "/chat",
            &[
                Part::File {
                    name: "image",
                    filename: "a.png",
                    bytes: &png,
                },
                Part::Text {
                    name: "message",
                    value: "What is she wearing?",
                },
            ],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({"response": "She is wearing a red jacket."})
    );

    let seen = backend.seen();
    assert!(seen[0].prompt.ends_with("User question: What is she wearing?"));
    assert_eq!(seen[0].image, Some((16, 16)));
}

#[tokio::test]
async fn test_image_chat_missing_or_blank_message_is_400() {
    let png = png_bytes(8, 8);

    for parts in [
        vec![Part::File {
            name: "image",
            filename: "a.png",
            bytes: &png,
        }],
        vec![
            Part::File {
                name: "image",
                filename: "a.png",
                bytes: &png,
            },
            Part::Text {
                name: "message",
                value: "   ",
            },
        ],
    ] {
        let backend = ScriptedBackend::with(vec![]);
        let resp = make_app(backend.clone())
            .oneshot(multipart_request("/chat", &parts))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "No message provided");
        assert!(backend.seen().is_empty());
    }
}

#[tokio::test]
async fn test_image_chat_missing_image_is_400() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(multipart_request(
            "/chat",
            &[Part::Text {
                name: "message",
                value: "hello",
            }],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No image uploaded");
}

// =============================================================================
// Text chat sessions
// =============================================================================

#[tokio::test]
async fn test_models_listing() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(empty_request("GET", "/api/models"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let models: ModelsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(models.models, vec!["llama3.2", "mistral"]);
    assert_eq!(models.default, "llama3.2");
}

#[tokio::test]
async fn test_create_session_with_empty_body_uses_defaults() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(empty_request("POST", "/api/sessions"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["mode"], "local");
    assert_eq!(body["model"], "llama3.2");
    assert_eq!(body["history"], serde_json::json!([]));
    assert!(body["session_id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn test_create_session_invalid_mode_is_400() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(json_request("POST", "/api/sessions", r#"{"mode":"remote"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid chat mode: remote");
}

#[tokio::test]
async fn test_first_message_round_trip() {
    let backend = ScriptedBackend::with(vec![Ok("hi there".to_string())]);
    let app = make_app(backend.clone());
    let id = create_session(&app, "{}").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            r#"{"message":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({
            "history": [{"user": "hello", "bot": "hi there"}],
            "input": "",
            "appended": true
        })
    );

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, BackendKind::OllamaGenerate);
    assert_eq!(seen[0].model, "llama3.2");
    assert_eq!(seen[0].prompt, "You: hello\nBot:");
    assert_eq!(seen[0].image, None);

    let resp = app
        .oneshot(empty_request("GET", &format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["history"][0]["bot"], "hi there");
}

#[tokio::test]
async fn test_blank_message_leaves_history_unchanged() {
    let backend = ScriptedBackend::with(vec![]);
    let app = make_app(backend.clone());
    let id = create_session(&app, "{}").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            r#"{"message":"   "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["appended"], false);
    assert_eq!(body["history"], serde_json::json!([]));
    assert!(backend.seen().is_empty());
}

#[tokio::test]
async fn test_backend_error_is_recorded_as_turn() {
    let backend = ScriptedBackend::with(vec![Err(BackendError::Transport {
        backend: "Ollama".to_string(),
        reason: "connection refused".to_string(),
    })]);
    let app = make_app(backend);
    let id = create_session(&app, "{}").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            r#"{"message":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["history"][0]["bot"],
        "Could not connect to Ollama: connection refused"
    );
}

#[tokio::test]
async fn test_switch_to_cloud_mode() {
    let backend = ScriptedBackend::with(vec![Ok("from gemini".to_string())]);
    let app = make_app(backend.clone());
    let id = create_session(&app, "{}").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/sessions/{}/mode", id),
            r#"{"mode":"cloud"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["mode"], "cloud");
    assert_eq!(body["status"], "Gemini mode selected");

    app.oneshot(json_request(
        "POST",
        &format!("/api/sessions/{}/messages", id),
        r#"{"message":"hello"}"#,
    ))
    .await
    .unwrap();

    let seen = backend.seen();
    assert_eq!(seen[0].kind, BackendKind::Gemini);
    assert_eq!(seen[0].prompt, "Human: hello\nAssistant:");
}

#[tokio::test]
async fn test_set_mode_changes_local_model() {
    let backend = ScriptedBackend::with(vec![]);
    let app = make_app(backend.clone());
    let id = create_session(&app, r#"{"mode":"cloud"}"#).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/sessions/{}/mode", id),
            r#"{"mode":"local","model":"mistral"}"#,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["status"], "Ollama mode selected");
    assert_eq!(body["model"], "mistral");

    app.oneshot(json_request(
        "POST",
        &format!("/api/sessions/{}/messages", id),
        r#"{"message":"hi"}"#,
    ))
    .await
    .unwrap();
    assert_eq!(backend.seen()[0].model, "mistral");
}

#[tokio::test]
async fn test_clear_history() {
    let backend = ScriptedBackend::with(vec![]);
    let app = make_app(backend.clone());
    let id = create_session(&app, "{}").await;

    for message in ["one", "two"] {
        app.clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/sessions/{}/messages", id),
                &format!(r#"{{"message":"{}"}}"#, message),
            ))
            .await
            .unwrap();
    }

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/sessions/{}/history", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!({"history": []}));
    assert_eq!(backend.seen().len(), 2);

    let resp = app
        .oneshot(empty_request("GET", &format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["history"], serde_json::json!([]));
}

#[tokio::test]
async fn test_delete_session() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let id = create_session(&app, "{}").await;

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(empty_request("GET", &format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"]
        .as_str()
        .unwrap()
        .starts_with("session not found"));
}

#[tokio::test]
async fn test_session_count_is_capped() {
    let mut config = ParleyConfig::default();
    config.sessions.max_sessions = 2;
    let app = create_router(make_state_with(ScriptedBackend::with(vec![]), config));

    for _ in 0..5 {
        create_session(&app, "{}").await;
    }

    let resp = app
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.sessions, 2);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", Uuid::new_v4()),
            r#"{"message":"hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_busy_session_is_409() {
    let backend = ScriptedBackend::with(vec![]);
    let state = make_state(backend.clone());
    let app = create_router(state.clone());
    let id = state.sessions.create(Default::default(), "llama3.2").session_id;

    let guard = state.sessions.acquire(id).unwrap();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            r#"{"message":"hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(backend.seen().is_empty());
    drop(guard);

    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            r#"{"message":"hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_message_body_must_be_json() {
    let app = make_app(ScriptedBackend::with(vec![]));
    let id = create_session(&app, "{}").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{}/messages", id),
            "not json",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}
