//! Routes for creating and driving demo sessions.

use std::path::{Component, Path as FsPath};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use democopilot_core::error::DomainError;
use democopilot_core::progress::ProgressSnapshot;
use democopilot_core::state::SessionState;
use democopilot_orchestration::application::coordinator::NewSession;
use democopilot_orchestration::domain::commands::ControlCommand;
use democopilot_orchestration::domain::question::FollowUp;
use democopilot_orchestration::domain::script::DemoScript;
use democopilot_orchestration::domain::session::CustomerInfo;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// How long POST /question waits for the answer before reporting it pending.
pub const ANSWER_WAIT: Duration = Duration::from_secs(120);

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateDemoRequest {
    /// Name of a script in the script directory, without extension.
    #[serde(default)]
    pub product: Option<String>,
    /// Inline YAML script. Takes precedence over `product`.
    #[serde(default)]
    pub script: Option<String>,
    /// Customer's name, used in the greeting and answers.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Customer's email.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Customer's company.
    #[serde(default)]
    pub customer_company: Option<String>,
    /// Narration voice.
    #[serde(default = "default_voice")]
    pub voice_id: String,
}

fn default_voice() -> String {
    "default".to_string()
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct DemoSessionResponse {
    /// New session id.
    pub session_id: Uuid,
    /// Script title.
    pub script: String,
    /// Initial state, always `idle`.
    pub state: SessionState,
    /// Step names in order. Valid targets for `skip`.
    pub steps: Vec<String>,
    /// Customer's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// Number of sessions.
    pub total: usize,
    /// One snapshot per session.
    pub sessions: Vec<ProgressSnapshot>,
}

/// Acknowledgement for start, control and delete.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// What happened.
    pub status: &'static str,
    /// Which command, for control requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    /// Session id.
    pub session_id: Uuid,
    /// Final progress, for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ProgressSnapshot>,
}

/// Request body for POST /{id}/question.
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    /// The question as asked.
    pub question: String,
}

/// Response body for POST /{id}/question.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    /// Question id.
    pub question_id: Uuid,
    /// The question as asked.
    pub question: String,
    /// `answered` or `pending`.
    pub status: &'static str,
    /// Spoken answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Follow-up requested with the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<FollowUp>,
    /// `true` if the walkthrough was redirected.
    pub jumped: bool,
    /// `true` if the canned fallback answer was used.
    pub fallback: bool,
    /// Time from the question being asked to the answer being spoken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
}

/// POST /
#[instrument(skip(state, request), fields(product = ?request.product))]
async fn create_demo(
    State(state): State<AppState>,
    Json(request): Json<CreateDemoRequest>,
) -> Result<(StatusCode, Json<DemoSessionResponse>), ApiError> {
    let script = match (&request.script, &request.product) {
        (Some(source), _) => DemoScript::from_yaml(source)?,
        (None, Some(product)) => load_script(&state.script_dir, product).await?,
        (None, None) => {
            return Err(DomainError::Validation(
                "either script or product is required".to_string(),
            )
            .into());
        }
    };

    let customer = CustomerInfo {
        name: request.customer_name,
        email: request.customer_email,
        company: request.customer_company,
    };
    let script_name = script.name.clone();
    let machine = state
        .coordinator
        .create(NewSession {
            script,
            customer: customer.clone(),
            voice_id: request.voice_id,
        })
        .await;

    info!(session_id = %machine.id(), script = %script_name, "demo session created");

    Ok((
        StatusCode::CREATED,
        Json(DemoSessionResponse {
            session_id: machine.id(),
            script: script_name,
            state: machine.state(),
            steps: machine.step_names(),
            customer_name: customer.name,
        }),
    ))
}

/// GET /
async fn list_demos(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state.coordinator.list().await;
    Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    })
}

/// POST /{id}/start
#[instrument(skip(state))]
async fn start_demo(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    // The driver runs detached. Its outcome is reported through events.
    let _driver = state.coordinator.start(session_id).await?;

    info!("demo started");

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "started",
            action: None,
            session_id,
            snapshot: None,
        }),
    ))
}

/// POST /{id}/control
#[instrument(skip(state, command), fields(action = command.name()))]
async fn control_demo(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(command): Json<ControlCommand>,
) -> Result<Json<StatusResponse>, ApiError> {
    let machine = state.coordinator.get(session_id).await?;
    machine.apply(&command).await?;

    info!("control command applied");

    Ok(Json(StatusResponse {
        status: "success",
        action: Some(command.name()),
        session_id,
        snapshot: None,
    }))
}

/// POST /{id}/question
#[instrument(skip(state, request))]
async fn ask_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<QuestionRequest>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let machine = state.coordinator.get(session_id).await?;
    let ticket = machine.ask_question(&request.question)?;
    let question_id = ticket.question_id;

    info!(question_id = %question_id, "question queued");

    let Ok(resolved) = tokio::time::timeout(ANSWER_WAIT, ticket.resolved()).await else {
        return Ok((
            StatusCode::ACCEPTED,
            Json(QuestionResponse {
                question_id,
                question: request.question,
                status: "pending",
                answer: None,
                directive: None,
                jumped: false,
                fallback: false,
                response_time_ms: None,
            }),
        ));
    };

    // The session was stopped or failed before reaching a step boundary.
    let Some(event) = resolved else {
        return Err(DomainError::InvalidTransition {
            operation: "answer question",
            state: machine.state(),
        }
        .into());
    };
    let Some(resolution) = event.resolution else {
        return Err(DomainError::Infrastructure(format!(
            "question {question_id} was returned unanswered"
        ))
        .into());
    };

    Ok((
        StatusCode::OK,
        Json(QuestionResponse {
            question_id,
            question: event.text,
            status: "answered",
            response_time_ms: Some((resolution.resolved_at - event.raised_at).num_milliseconds()),
            answer: Some(resolution.answer),
            directive: Some(resolution.directive),
            jumped: resolution.jumped,
            fallback: resolution.fallback,
        }),
    ))
}

/// GET /{id}/status
async fn demo_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    let machine = state.coordinator.get(session_id).await?;
    Ok(Json(machine.snapshot()))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn stop_demo(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.coordinator.remove(session_id).await?;

    info!("demo stopped and removed");

    Ok(Json(StatusResponse {
        status: "stopped",
        action: None,
        session_id,
        snapshot: Some(snapshot),
    }))
}

/// Reads `<dir>/<product>.yaml`.
async fn load_script(dir: &FsPath, product: &str) -> Result<DemoScript, DomainError> {
    let file = FsPath::new(product);
    let plain_name = !product.is_empty()
        && file
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        && file.components().count() == 1;
    if !plain_name {
        return Err(DomainError::Validation(format!(
            "invalid script name: {product}"
        )));
    }

    let path = dir.join(format!("{product}.yaml"));
    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DomainError::Validation(format!("unknown script: {product}")));
        }
        Err(e) => {
            return Err(DomainError::Infrastructure(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    DemoScript::from_yaml(&source)
}

/// Returns the router for demo sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_demo).get(list_demos))
        .route("/{session_id}", delete(stop_demo))
        .route("/{session_id}/start", post(start_demo))
        .route("/{session_id}/control", post(control_demo))
        .route("/{session_id}/question", post(ask_question))
        .route("/{session_id}/status", get(demo_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_script_rejects_path_traversal() {
        let result = load_script(FsPath::new("scripts"), "../secrets").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_script_reports_unknown_name() {
        let result = load_script(FsPath::new("/nonexistent-script-dir"), "tour").await;

        assert!(matches!(
            result,
            Err(DomainError::Validation(message)) if message.contains("unknown script")
        ));
    }
}
