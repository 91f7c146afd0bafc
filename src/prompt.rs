//! Prompt composition for one turn.
//!
//! `compose` is a pure string builder: same inputs, same prompt. The JSON
//! response contract at the end is fixed in code because the parser depends
//! on it; the prose around it comes from `Prompts`.

use crate::config::Prompts;
use crate::response::{EXAMPLES_CLOSE, EXAMPLES_OPEN};
use crate::styles::{AdventureStyle, StyleFragments};
use crate::util::fill_template;

/// Build the model instruction for an opening turn (`latest_answer = None`)
/// or for the evaluation of `latest_answer`.
pub fn compose(
  prompts: &Prompts,
  fragments: &StyleFragments,
  context: &str,
  history: &[String],
  style: AdventureStyle,
  latest_answer: Option<&str>,
) -> String {
  let preamble = fill_template(
    &prompts.preamble_template,
    &[("context", context), ("style", fragments.fragment(style))],
  );

  let turn = match latest_answer {
    Some(answer) => fill_template(&prompts.evaluation_template, &[("answer", answer)]),
    None => prompts.opening_instruction.clone(),
  };

  format!(
    "\n{preamble}\n\n{keys}\n\nPrevious answers:\n{history}\n\n{turn}\n\n{contract}\n\n{guidelines}",
    keys = prompts.key_instructions,
    history = history.join("\n"),
    contract = response_contract(latest_answer.is_some()),
    guidelines = prompts.guidelines,
  )
}

fn response_contract(evaluating: bool) -> String {
  let medal = if evaluating {
    "{\n    \"type\": \"bronze|silver|gold\",\n    \"message\": \"Detailed explanation of why they earned this medal\",\n    \"timestamp\": <current time as epoch milliseconds>\n  } or null if no medal is deserved"
  } else {
    "null"
  };
  format!(
    "Response Format (JSON):\n\
{{\n  \
\"scene\": \"Your detailed response, including:\n    \
- Rich environmental descriptions\n    \
- Clear educational content\n    \
- Thought-provoking questions\n    \
- Include example approaches, one per line, between {open} and {close} tags\",\n  \
\"examples\": [\n    \
\"Detailed example approach 1 showing one way of thinking\",\n    \
\"Detailed example approach 2 showing an alternative perspective\",\n    \
\"Detailed example approach 3 demonstrating creative problem-solving\"\n  \
],\n  \
\"medal\": {medal}\n\
}}",
    open = EXAMPLES_OPEN,
    close = EXAMPLES_CLOSE,
  )
}
