//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures become `{ error, kind }` with the
//! status chosen by the error taxonomy.

use std::sync::Arc;

use axum::{
  body::Bytes,
  extract::{rejection::JsonRejection, FromRequest, Path, State},
  http::{header::CONTENT_TYPE, HeaderMap},
  response::{IntoResponse, Response},
  Json,
};
use tracing::instrument;

use crate::error::QuestError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::styles::catalog;

impl IntoResponse for QuestError {
  fn into_response(self) -> Response {
    (self.status(), Json(ErrorOut::from(&self))).into_response()
  }
}

impl From<JsonRejection> for QuestError {
  fn from(rejection: JsonRejection) -> Self {
    QuestError::InvalidInput(rejection.body_text())
  }
}

/// `Json` extractor whose rejections use the error taxonomy.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(QuestError))]
pub struct JsonBody<T>(pub T);

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let config_error = state.gateway.configuration_error();
  Json(HealthOut { ok: true, model_configured: config_error.is_none(), config_error })
}

#[instrument(level = "info")]
pub async fn http_get_styles() -> impl IntoResponse {
  Json(StylesOut { styles: catalog() })
}

#[instrument(level = "info", skip(headers, body), fields(bytes = body.len()))]
pub async fn http_post_document(headers: HeaderMap, body: Bytes) -> Result<Json<DocumentOut>, QuestError> {
  let content_type = headers
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string();
  ingest_document(&content_type, body.to_vec()).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(style = %body.style))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  JsonBody(body): JsonBody<StartIn>,
) -> Result<Json<SessionOut>, QuestError> {
  start_session(&state, body.style, &body.notes, &body.document_text).await.map(Json)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, QuestError> {
  get_session(&state, &id).await.map(Json)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let removed = reset_session(&state, &id).await;
  Json(ResetOut { removed })
}

#[instrument(level = "info", skip(state, body), fields(%id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  JsonBody(body): JsonBody<AnswerIn>,
) -> Result<Json<TurnOut>, QuestError> {
  submit_answer(&state, &id, &body.answer).await.map(Json)
}
