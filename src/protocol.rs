//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Badge, SessionPhase};
use crate::error::QuestError;
use crate::session::Session;
use crate::styles::{AdventureStyle, StyleDescriptor};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListStyles,
    StartSession {
        #[serde(default)]
        style: AdventureStyle,
        #[serde(default)]
        notes: String,
        #[serde(default, rename = "documentText")]
        document_text: String,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: String,
        answer: String,
    },
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Styles {
        styles: Vec<StyleDescriptor>,
    },
    Session {
        session: SessionOut,
    },
    TurnResult {
        session: SessionOut,
        badge: Option<Badge>,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

/// DTO used by both WS and HTTP for session delivery.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: String,
    pub active: bool,
    pub phase: SessionPhase,
    pub style: AdventureStyle,
    /// Scene text for display: the examples block is already removed.
    pub scene: String,
    pub examples: Vec<String>,
    pub history: Vec<String>,
    pub badges: Vec<Badge>,
}

/// Convert a `Session` (internal) to the public DTO.
pub fn to_out(s: &Session) -> SessionOut {
    SessionOut {
        id: s.id().to_string(),
        active: s.is_active(),
        phase: s.phase(),
        style: s.style(),
        scene: s.display_scene(),
        examples: s.examples().to_vec(),
        history: s.history().to_vec(),
        badges: s.badges().to_vec(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartIn {
    #[serde(default)]
    pub style: AdventureStyle,
    #[serde(default)]
    pub notes: String,
    #[serde(default, rename = "documentText")]
    pub document_text: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    pub answer: String,
}
#[derive(Serialize)]
pub struct TurnOut {
    pub session: SessionOut,
    pub badge: Option<Badge>,
}

#[derive(Debug, Serialize)]
pub struct DocumentOut {
    pub text: String,
    pub pages: usize,
}

#[derive(Serialize)]
pub struct StylesOut {
    pub styles: Vec<StyleDescriptor>,
}

#[derive(Serialize)]
pub struct ResetOut {
    pub removed: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    #[serde(rename = "modelConfigured")]
    pub model_configured: bool,
    #[serde(rename = "configError", skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub kind: &'static str,
}

impl From<&QuestError> for ErrorOut {
    fn from(e: &QuestError) -> Self {
        Self { error: e.user_message(), kind: e.kind() }
    }
}
