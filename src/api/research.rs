//! Research handlers.
//!
//! Every run goes through [`run_topic`], which rejects blank topics and turns
//! pipeline failures into a [`RunError`] after logging them. The server keeps
//! serving after a failed run.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form, Json,
};
use thiserror::Error;

use super::types::{ErrorResponse, HealthResponse, ResearchRequest, ResearchResponse, TopicForm};
use super::ui::{self, Outcome};
use super::AppState;
use crate::pipeline::Report;

/// Why a run produced no output.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Please enter a topic to research.")]
    EmptyTopic,

    #[error("An error occurred: {0:#}")]
    Agent(anyhow::Error),
}

impl RunError {
    pub fn status(&self) -> StatusCode {
        match self {
            RunError::EmptyTopic => StatusCode::BAD_REQUEST,
            RunError::Agent(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Run the pipeline on `topic` as submitted; only blankness is checked.
async fn run_topic(state: &AppState, topic: &str) -> Result<Report, RunError> {
    if topic.trim().is_empty() {
        return Err(RunError::EmptyTopic);
    }

    state.researcher.research(topic).await.map_err(|e| {
        tracing::error!("Agent run failed for topic {:?}: {:#}", topic, e);
        RunError::Agent(e)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Page
// ─────────────────────────────────────────────────────────────────────────────

pub(super) async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(ui::render_page(&state.default_topic, Outcome::Idle))
}

pub(super) async fn run_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TopicForm>,
) -> Html<String> {
    let page = match run_topic(&state, &form.topic).await {
        Ok(report) => ui::render_page(&form.topic, Outcome::Output(&report.markdown())),
        Err(e) => ui::render_page(&form.topic, Outcome::Error(&e.to_string())),
    };
    Html(page)
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON API
// ─────────────────────────────────────────────────────────────────────────────

pub(super) async fn run_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let topic = req.topic.unwrap_or_else(|| state.default_topic.clone());
    let report = run_topic(&state, &topic).await.map_err(|e| {
        (
            e.status(),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    Ok(Json(ResearchResponse {
        run_id: report.run_id,
        topic: report.topic,
        output: report.output,
    }))
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
