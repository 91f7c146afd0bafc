//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! Messages on one socket are handled in order, so a client cannot overlap two
//! turns through the same connection.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::QuestError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::styles::catalog;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "study_quest", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "study_quest", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "study_quest", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { kind: "invalid_input", message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "kind": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "study_quest", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "study_quest", "WebSocket disconnected");
}

fn error_msg(e: QuestError) -> ServerWsMessage {
  ServerWsMessage::Error { kind: e.kind(), message: e.user_message() }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListStyles => ServerWsMessage::Styles { styles: catalog() },

    ClientWsMessage::StartSession { style, notes, document_text } => {
      match start_session(state, style, &notes, &document_text).await {
        Ok(session) => ServerWsMessage::Session { session },
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::SubmitAnswer { session_id, answer } => {
      match submit_answer(state, &session_id, &answer).await {
        Ok(turn) => ServerWsMessage::TurnResult { session: turn.session, badge: turn.badge },
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::GetSession { session_id } => match get_session(state, &session_id).await {
      Ok(session) => ServerWsMessage::Session { session },
      Err(e) => error_msg(e),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;
  use crate::gateway::testing::StubGateway;
  use crate::styles::StyleFragments;

  fn state(gw: StubGateway) -> AppState {
    AppState::new(Arc::new(gw), Prompts::default(), StyleFragments::default())
  }

  fn parse(json: &str) -> ClientWsMessage {
    serde_json::from_str(json).unwrap()
  }

  #[tokio::test]
  async fn start_then_answer_over_ws_messages() {
    let st = state(
      StubGateway::new()
        .reply(r#"{"scene":"Opening","medal":null}"#)
        .reply(r#"{"scene":"Next","medal":{"type":"bronze","message":"A start","timestamp":1}}"#),
    );

    let started = handle_client_ws(
      parse(r#"{"type":"start_session","style":"steampunk","notes":"Levers multiply force"}"#),
      &st,
    )
    .await;
    let id = match started {
      ServerWsMessage::Session { session } => {
        assert_eq!(session.scene, "Opening");
        session.id
      }
      other => panic!("unexpected {other:?}"),
    };

    let msg = format!(r#"{{"type":"submit_answer","sessionId":"{id}","answer":"Longer arm, less effort"}}"#);
    match handle_client_ws(parse(&msg), &st).await {
      ServerWsMessage::TurnResult { session, badge } => {
        assert_eq!(session.history, vec!["Longer arm, less effort"]);
        assert_eq!(badge.unwrap().tier.to_string(), "bronze");
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[tokio::test]
  async fn errors_carry_taxonomy_kind() {
    let st = state(StubGateway::new());
    let reply = handle_client_ws(parse(r#"{"type":"get_session","sessionId":"missing"}"#), &st).await;
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["kind"], "unknown_session");

    let pong = serde_json::to_value(handle_client_ws(parse(r#"{"type":"ping"}"#), &st).await).unwrap();
    assert_eq!(pong["type"], "pong");
  }
}
