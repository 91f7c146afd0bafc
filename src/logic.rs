//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Extracting text from an uploaded PDF (on the blocking pool)
//!   - Starting a session from document text + notes
//!   - Submitting an answer, reading and resetting a session
//!
//! Every failure is logged here once, at the turn boundary, and returned as a
//! `QuestError` whose `user_message` is what the client shows.

use tracing::{error, info, instrument, warn};

use crate::document::{build_context, extract_text, is_pdf_media_type};
use crate::error::QuestError;
use crate::protocol::{to_out, DocumentOut, SessionOut, TurnOut};
use crate::state::AppState;
use crate::styles::AdventureStyle;

#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len(), %content_type))]
pub async fn ingest_document(content_type: &str, bytes: Vec<u8>) -> Result<DocumentOut, QuestError> {
  if !is_pdf_media_type(content_type) {
    warn!(target: "study_quest", %content_type, "Rejected non-PDF upload");
    return Err(QuestError::UnsupportedMediaType(content_type.to_string()));
  }
  let extracted = tokio::task::spawn_blocking(move || extract_text(&bytes))
    .await
    .map_err(|e| QuestError::DocumentParse(format!("extraction task failed: {e}")))?;
  match extracted {
    Ok(doc) => {
      info!(target: "study_quest", pages = doc.pages, text_len = doc.text.len(), "PDF ingested");
      Ok(DocumentOut { text: doc.text, pages: doc.pages })
    }
    Err(e) => {
      error!(target: "study_quest", error = %e, "PDF extraction failed");
      Err(e)
    }
  }
}

#[instrument(level = "info", skip(state, notes, document_text), fields(%style, notes_len = notes.len(), doc_len = document_text.len()))]
pub async fn start_session(
  state: &AppState,
  style: AdventureStyle,
  notes: &str,
  document_text: &str,
) -> Result<SessionOut, QuestError> {
  let result = match build_context(document_text, notes) {
    Ok(context) => state.start_session(style, context).await,
    Err(e) => Err(e),
  };
  match result {
    Ok(session) => {
      info!(target: "session", id = %session.id(), %style, context_len = session.context().len(), "Opening scene delivered");
      Ok(to_out(&session))
    }
    Err(e) => {
      error!(target: "session", %style, kind = e.kind(), error = %e, "Session start failed");
      Err(e)
    }
  }
}

#[instrument(level = "info", skip(state, answer), fields(%session_id, answer_len = answer.len()))]
pub async fn submit_answer(state: &AppState, session_id: &str, answer: &str) -> Result<TurnOut, QuestError> {
  match state.submit_answer(session_id, answer).await {
    Ok((session, badge)) => {
      info!(target: "session", id = %session_id, turn = session.history().len(), badge = ?badge.as_ref().map(|b| b.tier), "Answer evaluated");
      Ok(TurnOut { session: to_out(&session), badge })
    }
    Err(e) => {
      error!(target: "session", id = %session_id, kind = e.kind(), error = %e, "Answer turn failed; session unchanged");
      Err(e)
    }
  }
}

#[instrument(level = "debug", skip(state), fields(%session_id))]
pub async fn get_session(state: &AppState, session_id: &str) -> Result<SessionOut, QuestError> {
  state.snapshot(session_id).await.map(|s| to_out(&s))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn reset_session(state: &AppState, session_id: &str) -> bool {
  let removed = state.reset(session_id).await;
  info!(target: "session", id = %session_id, removed, "Session reset");
  removed
}
