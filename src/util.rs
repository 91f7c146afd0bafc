//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Single pass: substituted values are never rescanned, so user text that
/// happens to contain `{context}` or similar is embedded verbatim.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(pos) = rest.find('{') {
    out.push_str(&rest[..pos]);
    let tail = &rest[pos..];
    let hit = pairs.iter().find(|(k, _)| {
      tail.len() > k.len() + 1
        && tail[1..].starts_with(k)
        && tail[1 + k.len()..].starts_with('}')
    });
    match hit {
      Some((k, v)) => {
        out.push_str(v);
        rest = &tail[k.len() + 2..];
      }
      None => {
        out.push('{');
        rest = &tail[1..];
      }
    }
  }
  out.push_str(rest);
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge prompts or model replies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
