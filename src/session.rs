//! Session state machine: Idle → Active, then one accepted answer per turn.
//!
//! A turn composes, generates and parses before touching `self`; only a fully
//! parsed reply is committed. A failed turn leaves the session exactly as it
//! was, which keeps `history.len()` equal to the number of accepted answers.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Badge, ModelResponse, SessionPhase};
use crate::error::QuestError;
use crate::gateway::ModelGateway;
use crate::prompt::compose;
use crate::response::{parse, split_examples};
use crate::styles::{AdventureStyle, StyleFragments};

#[derive(Clone, Debug)]
pub struct Session {
  id: String,
  phase: SessionPhase,
  style: AdventureStyle,
  context: String,
  current_scene: String,
  examples: Vec<String>,
  history: Vec<String>,
  badges: Vec<Badge>,
}

/// Prompt inputs shared by every session of the process.
#[derive(Clone, Copy)]
pub struct TurnEnv<'a> {
  pub gateway: &'a dyn ModelGateway,
  pub prompts: &'a Prompts,
  pub fragments: &'a StyleFragments,
}

impl Session {
  pub fn new(style: AdventureStyle) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      phase: SessionPhase::Idle,
      style,
      context: String::new(),
      current_scene: String::new(),
      examples: Vec::new(),
      history: Vec::new(),
      badges: Vec::new(),
    }
  }

  pub fn id(&self) -> &str { &self.id }
  pub fn phase(&self) -> SessionPhase { self.phase }
  pub fn is_active(&self) -> bool { self.phase == SessionPhase::Active }
  pub fn style(&self) -> AdventureStyle { self.style }
  pub fn context(&self) -> &str { &self.context }
  pub fn current_scene(&self) -> &str { &self.current_scene }
  pub fn examples(&self) -> &[String] { &self.examples }
  pub fn history(&self) -> &[String] { &self.history }
  pub fn badges(&self) -> &[Badge] { &self.badges }

  /// Scene text with the sentinel examples block removed.
  pub fn display_scene(&self) -> String {
    split_examples(self.current_scene()).0
  }

  /// Opening turn. Only valid from Idle.
  #[instrument(level = "info", skip(self, env, context), fields(session = %self.id, style = %self.style, context_len = context.len()))]
  pub async fn start(&mut self, env: TurnEnv<'_>, context: String) -> Result<(), QuestError> {
    if self.phase != SessionPhase::Idle {
      return Err(QuestError::InvalidState { action: "start", phase: self.phase.as_str() });
    }
    if context.trim().is_empty() {
      return Err(QuestError::InvalidInput("Session context is empty.".into()));
    }

    let prompt = compose(env.prompts, env.fragments, &context, &[], self.style, None);
    let reply = run_turn(env.gateway, &prompt).await?;

    if reply.badge.is_some() {
      warn!(target: "session", session = %self.id, "Dropping medal returned on opening turn");
    }
    self.context = context;
    self.current_scene = reply.scene;
    self.examples = reply.examples;
    self.history.clear();
    self.badges.clear();
    self.phase = SessionPhase::Active;
    info!(target: "session", session = %self.id, examples = self.examples.len(), "Session started");
    Ok(())
  }

  /// Evaluate one answer. Only valid from Active. Returns the badge earned on
  /// this turn, if any.
  #[instrument(level = "info", skip(self, env, answer), fields(session = %self.id, turn = self.history.len() + 1, answer_len = answer.len()))]
  pub async fn submit_answer(&mut self, env: TurnEnv<'_>, answer: &str) -> Result<Option<Badge>, QuestError> {
    if self.phase != SessionPhase::Active {
      return Err(QuestError::InvalidState { action: "accept answers", phase: self.phase.as_str() });
    }
    let answer = answer.trim();
    if answer.is_empty() {
      return Err(QuestError::InvalidInput("Please enter an answer.".into()));
    }

    let prompt = compose(env.prompts, env.fragments, &self.context, &self.history, self.style, Some(answer));
    let reply = run_turn(env.gateway, &prompt).await?;

    self.history.push(answer.to_string());
    self.current_scene = reply.scene;
    self.examples = reply.examples;
    if let Some(badge) = &reply.badge {
      self.badges.push(badge.clone());
      info!(target: "session", session = %self.id, tier = %badge.tier, "Badge awarded");
    }
    info!(target: "session", session = %self.id, history = self.history.len(), badges = self.badges.len(), "Answer accepted");
    Ok(reply.badge)
  }
}

async fn run_turn(gateway: &dyn ModelGateway, prompt: &str) -> Result<ModelResponse, QuestError> {
  let raw = gateway.generate(prompt).await?;
  parse(&raw)
}
