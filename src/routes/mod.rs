//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - `POST /text/generate`, `POST /questions/generate`, `GET /models`
/// - `GET /` banner and `GET /health`
/// - CORS limited to the configured origins (any method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.settings.cors_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(http::http_root))
        .route("/health", get(http::http_health))
        .route("/text/generate", post(http::http_generate_text))
        .route("/questions/generate", post(http::http_generate_questions))
        .route("/models", get(http::http_list_models))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target: "lector_backend", origin = %o, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::protocol::QuestionsOut;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SIMPLE: &str = "The cat sat on the mat. The dog ran to the park. We had fun.";

    async fn groq_replying(content: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": content } }]
            })))
            .mount(&server)
            .await;
        server
    }

    fn app(server: &MockServer) -> Router {
        let settings = Settings {
            default_provider: "groq".into(),
            groq_base_url: server.uri(),
            groq_api_key: Some("gsk_test".into()),
            ..Settings::default()
        };
        build_router(Arc::new(AppState::with_settings(settings).unwrap()))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn root_and_health() {
        let server = MockServer::start().await;
        let (status, body) = call(app(&server), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Reading Passage & Questions API");

        let (_, body) = call(app(&server), "GET", "/health", None).await;
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn english_passage_in_band_on_first_try() {
        let server = groq_replying(SIMPLE).await;
        let req = json!({ "topic": "Pets", "language": "English", "level": "Basic", "style": "Casual" });
        let (status, body) = call(app(&server), "POST", "/text/generate", Some(req)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generated_text"], SIMPLE);
        assert_eq!(body["iterations"], 1);
        assert_eq!(body["level"], "Basic");
        assert_eq!(body["score"], 2.0);
        assert_eq!(body["failed_texts"], json!([]));
        assert_eq!(body["prompts_used"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn french_passage_is_unscored() {
        let server = groq_replying("Les volcans sont des montagnes qui crachent de la lave.").await;
        let req = json!({ "topic": "Volcans", "language": "French", "level": "Intermediate", "style": "Formal", "provider": "groq" });
        let (status, body) = call(app(&server), "POST", "/text/generate", Some(req)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], Value::Null);
        assert_eq!(body["iterations"], 1);
        assert_eq!(body["language"], "French");
    }

    #[tokio::test]
    async fn empty_topic_is_a_bad_request() {
        let server = MockServer::start().await;
        let req = json!({ "topic": " ", "language": "English", "level": "Basic", "style": "Formal" });
        let (status, body) = call(app(&server), "POST", "/text/generate", Some(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Topic cannot be empty");
    }

    #[tokio::test]
    async fn unknown_provider_and_level_are_rejected() {
        let server = MockServer::start().await;
        let req = json!({ "topic": "Tides", "language": "English", "level": "Basic", "style": "Formal", "provider": "openai" });
        let (status, body) = call(app(&server), "POST", "/text/generate", Some(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "unknown provider: openai");

        let req = json!({ "topic": "Tides", "language": "English", "level": "Expert", "style": "Formal" });
        let (status, _) = call(app(&server), "POST", "/text/generate", Some(req)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn provider_failure_on_first_attempt_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": { "message": "over capacity" } })))
            .mount(&server)
            .await;
        let req = json!({ "topic": "Tides", "language": "English", "level": "Advanced", "style": "Formal" });
        let (status, body) = call(app(&server), "POST", "/text/generate", Some(req)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "groq request failed: HTTP 503: over capacity");
    }

    #[tokio::test]
    async fn questions_round_trip() {
        let content = json!({ "questions": [
            { "question": "Where did the cat sit?", "choices": ["Mat", "Park", "Bed", "Car"], "answer": "Mat" }
        ]})
        .to_string();
        let server = groq_replying(&content).await;
        let req = json!({ "generated_text": SIMPLE, "num_questions": 1, "language": "English", "choices_num": 4 });
        let (status, body) = call(app(&server), "POST", "/questions/generate", Some(req)).await;

        assert_eq!(status, StatusCode::OK);
        let out: QuestionsOut = serde_json::from_value(body).unwrap();
        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.questions[0].answer, "Mat");
    }

    #[tokio::test]
    async fn unparseable_questions_expose_raw_output() {
        let server = groq_replying("not json at all").await;
        let req = json!({ "generated_text": SIMPLE, "num_questions": 2, "language": "English", "choices_num": 4 });
        let (status, body) = call(app(&server), "POST", "/questions/generate", Some(req)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["raw_output"], "not json at all");
        assert!(body["detail"].as_str().unwrap().starts_with("could not parse valid JSON questions"));
    }

    #[test]
    fn invalid_origins_are_skipped() {
        // Must not panic on a value that is not a valid header.
        let _ = allowed_origins(&["http://localhost:3000".into(), "bad\norigin".into()]);
    }
}
