//! Configuration: model gateway settings from the environment, and the agent
//! config (prompt text + style overrides) from TOML.
//!
//! Everything here is read once at process start and injected downward.

use std::{collections::HashMap, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::styles::{AdventureStyle, StyleFragments};

/// Value shipped in example `.env` files. Treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

/// Settings for the hosted model. The key is kept optional so that a missing
/// credential surfaces as a configuration error on first use, not at boot.
#[derive(Clone)]
pub struct GatewayConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GatewayConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("timeout", &self.timeout)
      .finish()
  }
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
      timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
  }
}

impl GatewayConfig {
  pub fn from_env() -> Self {
    let api_key = std::env::var("GEMINI_API_KEY").ok();
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("GEMINI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .map(Duration::from_secs)
      .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    Self { api_key, base_url, model, timeout }
  }

  /// The usable credential, or the user-facing reason there is none.
  pub fn credential(&self) -> Result<&str, String> {
    match self.api_key.as_deref().map(str::trim) {
      Some(k) if !k.is_empty() && k != PLACEHOLDER_API_KEY => Ok(k),
      _ => Err("Please set your Gemini API key (GEMINI_API_KEY) in the environment or .env file".into()),
    }
  }
}

/// Upload limits for the HTTP layer.
#[derive(Clone, Debug)]
pub struct ServerConfig {
  pub port: u16,
  pub max_document_bytes: usize,
}

impl ServerConfig {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    let max_document_bytes = std::env::var("MAX_DOCUMENT_BYTES")
      .ok()
      .and_then(|s| s.parse::<usize>().ok())
      .unwrap_or(DEFAULT_MAX_DOCUMENT_BYTES);
    Self { port, max_document_bytes }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// Keyed by style id (`fantasy`, `scifi`, ...).
  #[serde(default)]
  pub styles: HashMap<String, StyleCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StyleCfg {
  pub prompt: String,
}

impl AgentConfig {
  /// Style fragment overrides; unknown style ids are logged and skipped.
  pub fn style_fragments(&self) -> StyleFragments {
    let mut overrides = HashMap::new();
    for (id, cfg) in &self.styles {
      match AdventureStyle::from_str(id) {
        Ok(style) => { overrides.insert(style, cfg.prompt.clone()); }
        Err(_) => warn!(target: "study_quest", style = %id, "Ignoring override for unknown style"),
      }
    }
    StyleFragments::new(overrides)
  }
}

/// Prompt text blocks used by the composer. Defaults reproduce the stock
/// study-adventure prompt; any field can be overridden in TOML.
///
/// Placeholders: `{context}` and `{style}` in `preamble_template`,
/// `{answer}` in `evaluation_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub preamble_template: String,
  pub key_instructions: String,
  pub evaluation_template: String,
  pub opening_instruction: String,
  pub guidelines: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      preamble_template: "You are an expert educational AI creating an immersive learning experience with the following content:\n\n{context}\n\nStyle Context: {style}".into(),
      key_instructions: "Key Instructions:\n\
1. Create HIGHLY DETAILED and VIVID scenes that bring the learning material to life\n\
2. Use rich sensory descriptions and environmental details to enhance immersion\n\
3. Create complex, thought-provoking questions that encourage deep understanding\n\
4. Provide diverse example approaches that showcase different thinking strategies\n\
5. Evaluate answers thoroughly and award medals based on:\n   \
- Bronze: Basic understanding with some key concepts identified\n   \
- Silver: Good comprehension with clear application and connections\n   \
- Gold: Exceptional understanding with creative application, unique insights, or complex connections".into(),
      evaluation_template: "Student's answer: {answer}\n\n\
Provide a detailed evaluation:\n\
1. Thorough analysis of their understanding\n\
2. Specific examples from their answer that demonstrate comprehension\n\
3. Detailed explanation of any misconceptions\n\
4. Clear connections to previous concepts\n\
5. Award exactly one medal (bronze, silver or gold) if deserved, or none, with specific reasoning\n\
6. Lead into the next concept with a compelling scenario".into(),
      opening_instruction: "Create an engaging first learning scenario".into(),
      guidelines: "Guidelines:\n\
- Create immersive, detailed scenes that enhance learning\n\
- Ask complex questions that require deep understanding\n\
- Provide diverse and detailed example approaches\n\
- Give thorough, constructive feedback\n\
- Use the style elements to create memorable learning experiences\n\
- Ensure your response is valid JSON".into(),
    }
  }
}

/// Read and parse an agent config file.
pub fn load_agent_config(path: &Path) -> Result<AgentConfig, String> {
  let s = std::fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
  toml::from_str::<AgentConfig>(&s).map_err(|e| format!("parse {}: {e}", path.display()))
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match load_agent_config(Path::new(&path)) {
    Ok(cfg) => {
      info!(target: "study_quest", %path, style_overrides = cfg.styles.len(), "Loaded agent config (TOML)");
      Some(cfg)
    }
    Err(e) => {
      error!(target: "study_quest", %path, error = %e, "Failed to load agent config; using defaults");
      None
    }
  }
}
