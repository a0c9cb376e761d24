//! HTTP endpoint handlers. These are thin wrappers that forward to the services.
//! Each handler is instrumented with a request id and logs basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::list_models;
use crate::domain::GeneratedPassage;
use crate::error::AppError;
use crate::passages::generate_passage;
use crate::protocol::*;
use crate::questions::generate_questions;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_root() -> impl IntoResponse { Json(RootOut { message: "Reading Passage & Questions API" }) }

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(request_id = %Uuid::new_v4(), %body.level, %body.language, provider = ?body.provider, topic_len = body.topic.len()))]
pub async fn http_generate_text(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateTextIn>,
) -> Result<Json<GeneratedPassage>, AppError> {
  let provider = state.provider(body.provider.as_deref(), body.model.as_deref())?;
  let passage = generate_passage(
    provider.as_ref(),
    &state.settings.prompts,
    state.settings.max_iterations,
    &body.topic,
    &body.language,
    body.level,
    &body.style,
  )
  .await?;
  info!(target: "passage", iterations = passage.iterations, score = ?passage.score, failed = passage.failed_texts.len(), "HTTP passage served");
  Ok(Json(passage))
}

#[instrument(level = "info", skip(state, body), fields(request_id = %Uuid::new_v4(), num_questions = body.num_questions, choices_num = body.choices_num, %body.language, provider = ?body.provider, text_len = body.generated_text.len()))]
pub async fn http_generate_questions(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateQuestionsIn>,
) -> Result<Json<QuestionsOut>, AppError> {
  let provider = state.provider(body.provider.as_deref(), body.model.as_deref())?;
  let set = generate_questions(
    provider.as_ref(),
    &state.settings.prompts,
    &body.generated_text,
    &body.language,
    body.num_questions,
    body.choices_num,
  )
  .await?;
  info!(target: "questions", count = set.questions.len(), "HTTP questions served");
  Ok(Json(QuestionsOut { questions: set.questions }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let models = list_models(&state.settings, &state.http).await;
  info!(target: "lector_backend", count = models.len(), "HTTP models served");
  Json(ModelsOut { models })
}
