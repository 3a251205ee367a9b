//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use democopilot_core::browser::BrowserAutomation;
use democopilot_core::language_model::LanguageModel;
use democopilot_orchestration::config::EngineConfig;
use democopilot_test_support::{
    RecordingBrowser, ScriptedLanguageModel, ScriptedSpeech, StaticProvider, TokioClock,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use democopilot_api::state::AppState;

/// Two short steps. Narration takes one second per step.
pub const TWO_STEP_SCRIPT: &str = r##"
name: Short tour
steps:
  - name: intro
    narration: Welcome to the tour.
    actions:
      - kind: click
        selector: "#start"
  - name: pricing
    narration: Here is how pricing works.
    actions:
      - kind: click
        selector: "#pricing"
"##;

/// Directory holding the sample scripts shipped with the repository.
pub fn script_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scripts")
}

/// Build the full app router over test collaborators. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app() -> (Router, AppState) {
    build_test_app_with(
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedLanguageModel::answering("Pricing is per seat.")),
    )
}

/// Build the app with a specific browser and language model.
pub fn build_test_app_with(
    browser: Arc<dyn BrowserAutomation>,
    model: Arc<dyn LanguageModel>,
) -> (Router, AppState) {
    let provider = StaticProvider {
        browser,
        speech: Arc::new(ScriptedSpeech::fixed(Duration::from_secs(1))),
        model,
    };
    let state = AppState::with_provider(
        Arc::new(provider),
        Arc::new(TokioClock::new()),
        EngineConfig::default(),
        script_dir(),
    );
    (democopilot_api::app(state.clone()), state)
}

/// Send a request with an optional JSON body and return the response.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections come back as plain text.
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&body_bytes).into_owned())
    });

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

/// Send a DELETE request and return the response.
pub async fn delete_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, None).await
}

/// Create a session from `script` and return its id.
pub async fn create_session(app: &Router, script: &str) -> String {
    let (status, json) = post_json(
        app.clone(),
        "/api/v1/demos",
        &serde_json::json!({ "script": script, "customer_name": "Grace" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["session_id"].as_str().unwrap().to_string()
}
