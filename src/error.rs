//! Error taxonomy shared by the ingestor, gateway, parser and session core.
//!
//! Every variant maps to one user-visible message and one HTTP status, so the
//! transport layer never needs to inspect error internals.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestError {
  /// Missing or placeholder model credential. Blocks every session start.
  #[error("{0}")]
  Configuration(String),

  /// The uploaded document could not be read as a PDF.
  #[error("Error processing PDF file: {0}")]
  DocumentParse(String),

  /// The remote model service rejected the credential.
  #[error("Invalid Gemini API key. Please check your configuration and ensure you have set a valid API key.")]
  Authentication,

  /// The model reply was neither JSON nor contained a recoverable JSON object.
  #[error("Failed to parse response. Please try again.")]
  ResponseFormat,

  /// Any other network or service failure.
  #[error("{0}")]
  Transient(String),

  #[error("{0}")]
  InvalidInput(String),

  #[error("Session cannot {action} while {phase}")]
  InvalidState { action: &'static str, phase: &'static str },

  #[error("A turn is already in progress for this session. Please wait for it to finish.")]
  TurnInProgress,

  #[error("Unknown session: {0}")]
  UnknownSession(String),

  #[error("Unsupported media type '{0}'. PDF files only.")]
  UnsupportedMediaType(String),
}

impl QuestError {
  /// Stable machine-readable name, used in API error bodies and logs.
  pub fn kind(&self) -> &'static str {
    match self {
      QuestError::Configuration(_) => "configuration",
      QuestError::DocumentParse(_) => "document_parse",
      QuestError::Authentication => "authentication",
      QuestError::ResponseFormat => "response_format",
      QuestError::Transient(_) => "transient",
      QuestError::InvalidInput(_) => "invalid_input",
      QuestError::InvalidState { .. } => "invalid_state",
      QuestError::TurnInProgress => "turn_in_progress",
      QuestError::UnknownSession(_) => "unknown_session",
      QuestError::UnsupportedMediaType(_) => "unsupported_media_type",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      QuestError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
      QuestError::DocumentParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
      QuestError::Authentication | QuestError::ResponseFormat | QuestError::Transient(_) => {
        StatusCode::BAD_GATEWAY
      }
      QuestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      QuestError::InvalidState { .. } | QuestError::TurnInProgress => StatusCode::CONFLICT,
      QuestError::UnknownSession(_) => StatusCode::NOT_FOUND,
      QuestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    }
  }

  /// The single message shown to the user for a failed turn.
  pub fn user_message(&self) -> String {
    self.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn response_format_message_matches_contract() {
    assert_eq!(
      QuestError::ResponseFormat.user_message(),
      "Failed to parse response. Please try again."
    );
  }

  #[test]
  fn recoverable_errors_map_to_distinct_statuses() {
    assert_eq!(QuestError::Configuration("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(QuestError::DocumentParse("x".into()).status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(QuestError::TurnInProgress.status(), StatusCode::CONFLICT);
    assert_eq!(QuestError::UnknownSession("s".into()).kind(), "unknown_session");
  }
}
