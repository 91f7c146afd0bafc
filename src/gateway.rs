//! Model gateway: one prompt in, one raw text reply out.
//!
//! `GeminiClient` calls the Generative Language REST API (`generateContent`).
//! The credential is checked before anything touches the network. Calls are
//! instrumented with model name, latency and token usage (never the key and
//! never the full prompt).

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::GatewayConfig;
use crate::error::QuestError;

#[async_trait]
pub trait ModelGateway: Send + Sync {
  /// Send one prompt and return the reply text unmodified.
  async fn generate(&self, prompt: &str) -> Result<String, QuestError>;

  /// Why this gateway cannot serve requests, if it cannot.
  fn configuration_error(&self) -> Option<String> {
    None
  }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
  client: reqwest::Client,
  config: GatewayConfig,
}

impl GeminiClient {
  pub fn new(config: GatewayConfig) -> Result<Self, QuestError> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| QuestError::Transient(format!("HTTP client init failed: {e}")))?;
    Ok(Self { client, config })
  }

  pub fn model(&self) -> &str {
    &self.config.model
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }
}

#[async_trait]
impl ModelGateway for GeminiClient {
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
  async fn generate(&self, prompt: &str) -> Result<String, QuestError> {
    let api_key = self.config.credential().map_err(QuestError::Configuration)?;

    let url = format!(
      "{}/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    );
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "study-quest-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("x-goog-api-key", api_key)
      .json(&req)
      .send()
      .await
      .map_err(|e| {
        error!(elapsed = ?start.elapsed(), error = %e, "Gemini request failed");
        QuestError::Transient(format!("Model request failed: {e}"))
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let err = classify_failure(status, &body);
      error!(elapsed = ?start.elapsed(), %status, kind = err.kind(), "Gemini returned an error");
      return Err(err);
    }

    let body: GenerateContentResponse = res
      .json()
      .await
      .map_err(|e| QuestError::Transient(format!("Unreadable model response: {e}")))?;
    if let Some(usage) = &body.usage_metadata {
      info!(prompt_tokens = ?usage.prompt_token_count, completion_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }

    let text = body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
      .unwrap_or_default();
    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "Model response received");
    Ok(text)
  }

  fn configuration_error(&self) -> Option<String> {
    self.config.credential().err()
  }
}

/// Map a non-success HTTP reply to the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str) -> QuestError {
  let detail = extract_gemini_error(body);
  let message = detail.as_ref().map(|d| d.message.as_str()).unwrap_or(body);
  let rpc_status = detail.as_ref().and_then(|d| d.status.as_deref()).unwrap_or("");

  let bad_credential = message.contains("API key not valid")
    || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    || matches!(rpc_status, "UNAUTHENTICATED" | "PERMISSION_DENIED");
  if bad_credential {
    QuestError::Authentication
  } else {
    QuestError::Transient(format!("Gemini HTTP {status}: {message}"))
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
  contents: Vec<Content>,
}
#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}
#[derive(Serialize)]
struct Part {
  text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}

struct GeminiErrorDetail {
  message: String,
  status: Option<String>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<GeminiErrorDetail> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
    #[serde(default)]
    status: Option<String>,
  }
  serde_json::from_str::<EWrap>(body)
    .ok()
    .map(|w| GeminiErrorDetail { message: w.error.message, status: w.error.status })
}
