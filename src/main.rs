//! Study Quest · interactive study-adventure backend
//!
//! - Axum HTTP + WebSocket API
//! - PDF text extraction for uploaded study material
//! - Gemini-backed scene generation and answer evaluation
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   GEMINI_API_KEY      : required before any session can start
//!   GEMINI_BASE_URL     : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL        : default "gemini-2.0-flash"
//!   GEMINI_TIMEOUT_SECS : default 60
//!   MAX_DOCUMENT_BYTES  : upload limit for /api/v1/document (default 20 MiB)
//!   AGENT_CONFIG_PATH   : path to TOML config (prompt text + style overrides)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod config;
mod document;
mod domain;
mod error;
mod gateway;
mod logic;
mod prompt;
mod protocol;
mod response;
mod routes;
mod session;
mod state;
mod styles;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let server = ServerConfig::from_env();

  // Shared state: session store, prompts, Gemini client (config read once here).
  let state = Arc::new(AppState::from_env()?);

  let app = build_router(state, server.max_document_bytes);

  let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "study_quest", %addr, max_document_bytes = server.max_document_bytes, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "study_quest", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "study_quest", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "study_quest", "Shutdown signal received");
}
