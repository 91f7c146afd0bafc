//! Domain models: badges, parsed model replies and the session phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merit tier awarded after one evaluated answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeTier {
  #[serde(alias = "Bronze", alias = "BRONZE")]
  Bronze,
  #[serde(alias = "Silver", alias = "SILVER")]
  Silver,
  #[serde(alias = "Gold", alias = "GOLD")]
  Gold,
}

/// An achievement attached to one submitted answer. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Badge {
  pub tier: BadgeTier,
  pub message: String,
  #[serde(rename = "awardedAt", with = "chrono::serde::ts_milliseconds")]
  pub awarded_at: DateTime<Utc>,
}

/// Reply of one turn, already validated. Transient: consumed by the session.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelResponse {
  /// Raw scene text, possibly still carrying the sentinel examples block.
  pub scene: String,
  pub examples: Vec<String>,
  pub badge: Option<Badge>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  #[default]
  Idle,
  Active,
}

impl SessionPhase {
  pub fn as_str(&self) -> &'static str {
    match self {
      SessionPhase::Idle => "idle",
      SessionPhase::Active => "active",
    }
  }
}
