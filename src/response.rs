//! Model reply parsing and the sentinel examples block.
//!
//! Strict JSON first. If that fails, the greedy `{ ... }` span (first open
//! brace to last close brace) is tried, which recovers replies wrapped in
//! prose or markdown fences. Prose that itself contains braces can defeat
//! the fallback; such replies surface as `ResponseFormat`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::{Badge, BadgeTier, ModelResponse};
use crate::error::QuestError;
use crate::util::trunc_for_log;

pub const EXAMPLES_OPEN: &str = "<!-- examples -->";
pub const EXAMPLES_CLOSE: &str = "<!-- end examples -->";

static EXAMPLES_BLOCK: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"<!-- examples -->[\s\S]*?<!-- end examples -->").expect("static regex"));

static EXAMPLES_LINES: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"<!-- examples -->\r?\n([\s\S]*?)\r?\n<!-- end examples -->").expect("static regex")
});

#[derive(Deserialize)]
struct WireResponse {
  scene: String,
  #[serde(default)]
  examples: Option<Vec<String>>,
  #[serde(default)]
  medal: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireMedal {
  #[serde(rename = "type")]
  tier: BadgeTier,
  #[serde(default)]
  message: String,
  #[serde(default)]
  timestamp: Option<serde_json::Value>,
}

/// Parse one raw model reply.
#[instrument(level = "debug", skip(raw), fields(raw_len = raw.len()))]
pub fn parse(raw: &str) -> Result<ModelResponse, QuestError> {
  let wire = match serde_json::from_str::<WireResponse>(raw.trim()) {
    Ok(w) => w,
    Err(strict) => {
      debug!(target: "study_quest", error = %strict, "Strict parse failed; trying outer-brace span");
      let span = outer_brace_span(raw).ok_or_else(|| {
        warn!(target: "study_quest", preview = %trunc_for_log(raw, 120), "No JSON object in model reply");
        QuestError::ResponseFormat
      })?;
      serde_json::from_str::<WireResponse>(span).map_err(|e| {
        warn!(target: "study_quest", error = %e, preview = %trunc_for_log(span, 120), "Recovered span is not a valid reply");
        QuestError::ResponseFormat
      })?
    }
  };
  Ok(into_response(wire))
}

fn outer_brace_span(raw: &str) -> Option<&str> {
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  (start < end).then(|| &raw[start..=end])
}

fn into_response(wire: WireResponse) -> ModelResponse {
  let (_, block_examples) = split_examples(&wire.scene);
  let examples = if block_examples.is_empty() {
    wire
      .examples
      .unwrap_or_default()
      .into_iter()
      .map(|e| e.trim().to_string())
      .filter(|e| !e.is_empty())
      .collect()
  } else {
    block_examples
  };

  let badge = wire.medal.and_then(badge_from_value);

  ModelResponse { scene: wire.scene, examples, badge }
}

/// A medal that is not a bronze/silver/gold object means "no medal"; the
/// scene is still usable.
fn badge_from_value(v: serde_json::Value) -> Option<Badge> {
  if v.is_null() {
    return None;
  }
  match serde_json::from_value::<WireMedal>(v) {
    Ok(m) => Some(Badge {
      tier: m.tier,
      message: m.message,
      awarded_at: m.timestamp.as_ref().and_then(timestamp_from_value).unwrap_or_else(Utc::now),
    }),
    Err(e) => {
      warn!(target: "study_quest", error = %e, "Ignoring malformed medal in model reply");
      None
    }
  }
}

fn timestamp_from_value(v: &serde_json::Value) -> Option<DateTime<Utc>> {
  let millis = v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))?;
  DateTime::from_timestamp_millis(millis)
}

/// Remove every sentinel block from `scene`. Idempotent: runs to a fixpoint,
/// so a block reassembled by a removal is removed as well.
pub fn strip_examples(scene: &str) -> String {
  let mut out = scene.to_string();
  while EXAMPLES_BLOCK.is_match(&out) {
    out = EXAMPLES_BLOCK.replace_all(&out, "").into_owned();
  }
  out
}

/// Display text and the example lines of the first sentinel block.
pub fn split_examples(scene: &str) -> (String, Vec<String>) {
  let examples = EXAMPLES_LINES
    .captures(scene)
    .and_then(|c| c.get(1))
    .map(|m| {
      m.as_str()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default();
  (strip_examples(scene), examples)
}

#[cfg(test)]
mod tests {
  use super::*;

  const OPENING: &str = r#"{"scene":"A forest glows...\n<!-- examples -->\nExample A\nExample B\n<!-- end examples -->","examples":["Example A","Example B"],"medal":null}"#;

  #[test]
  fn strict_json_round_trips_fields() {
    let raw = r#"{"scene":"Hello","examples":["x","y"],"medal":{"type":"gold","message":"Superb","timestamp":1700000000000}}"#;
    let r = parse(raw).unwrap();
    assert_eq!(r.scene, "Hello");
    assert_eq!(r.examples, vec!["x", "y"]);
    let b = r.badge.unwrap();
    assert_eq!(b.tier, BadgeTier::Gold);
    assert_eq!(b.message, "Superb");
    assert_eq!(b.awarded_at.timestamp_millis(), 1_700_000_000_000);
  }

  #[test]
  fn prose_wrapped_reply_parses_like_bare_json() {
    let wrapped = format!("Sure! Here is your scene:\n```json\n{OPENING}\n```\nEnjoy.");
    assert_eq!(parse(&wrapped).unwrap(), parse(OPENING).unwrap());
  }

  #[test]
  fn reply_without_brace_span_is_format_error() {
    assert!(matches!(parse("no json here"), Err(QuestError::ResponseFormat)));
    assert!(matches!(parse("} backwards {"), Err(QuestError::ResponseFormat)));
    assert!(matches!(parse("{ not: json }"), Err(QuestError::ResponseFormat)));
  }

  #[test]
  fn missing_scene_is_format_error() {
    assert!(matches!(parse(r#"{"examples":[]}"#), Err(QuestError::ResponseFormat)));
  }

  #[test]
  fn capitalized_tier_and_missing_timestamp_are_accepted() {
    let before = Utc::now();
    let r = parse(r#"{"scene":"s","medal":{"type":"Silver","message":"ok"}}"#).unwrap();
    let b = r.badge.unwrap();
    assert_eq!(b.tier, BadgeTier::Silver);
    assert!(b.awarded_at >= before);
  }

  #[test]
  fn malformed_medal_keeps_the_scene() {
    let r = parse(r#"{"scene":"Good scene","examples":["a"],"medal":{}}"#).unwrap();
    assert_eq!(r.scene, "Good scene");
    assert_eq!(r.examples, vec!["a"]);
    assert_eq!(r.badge, None);

    let r = parse(r#"{"scene":"Good scene","medal":{"type":"none","message":"Keep going"}}"#).unwrap();
    assert_eq!(r.scene, "Good scene");
    assert_eq!(r.badge, None);

    let r = parse(r#"{"scene":"Good scene","medal":"gold"}"#).unwrap();
    assert_eq!(r.badge, None);
  }

  #[test]
  fn examples_from_block_take_precedence() {
    let r = parse(OPENING).unwrap();
    assert_eq!(r.examples, vec!["Example A", "Example B"]);
    let r = parse(r#"{"scene":"plain","examples":["only field"," "]}"#).unwrap();
    assert_eq!(r.examples, vec!["only field"]);
  }

  #[test]
  fn split_removes_block_from_display() {
    let (display, examples) = split_examples("A forest glows...\n<!-- examples -->\nExample A\n\nExample B\n<!-- end examples -->\nWhat now?");
    assert_eq!(display, "A forest glows...\n\nWhat now?");
    assert_eq!(examples, vec!["Example A", "Example B"]);
  }

  #[test]
  fn stripping_is_idempotent() {
    let inputs = [
      "a <!-- examples -->\nx\n<!-- end examples --> b <!-- examples -->y<!-- end examples -->",
      "<!-- exa<!-- examples -->x<!-- end examples -->mples -->z<!-- end examples -->",
      "dangling <!-- end examples --> marker",
    ];
    for s in inputs {
      let once = strip_examples(s);
      assert_eq!(strip_examples(&once), once);
      assert!(!EXAMPLES_BLOCK.is_match(&once));
    }
  }

  #[test]
  fn unmarked_text_is_unchanged() {
    let s = "  Just a scene.\n";
    let (display, examples) = split_examples(s);
    assert_eq!(display, s);
    assert!(examples.is_empty());
  }
}
