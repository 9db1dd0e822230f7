//! Parses the model's reply into a tool action or a final answer.
//!
//! The expected shape is a single JSON blob, fenced or bare:
//! `{"action": "@bing", "action_input": "site:leicestershire.gov.uk ..."}`
//! with `"Final Answer"` as the terminating action name.

use serde::Deserialize;
use serde_json::Value;

pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    Tool { name: String, input: String },
    FinalAnswer(String),
}

#[derive(Debug, Deserialize)]
struct ActionBlob {
    action: String,
    #[serde(default)]
    action_input: Value,
}

/// Parse a model reply. `None` means unparseable; the caller keeps the raw
/// reply for the corrective re-prompt.
pub fn parse_action(reply: &str) -> Option<AgentAction> {
    let blob = extract_json_blob(reply)?;
    let parsed: ActionBlob = serde_json::from_str(blob).ok()?;

    let input = match parsed.action_input {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    };

    if parsed.action == FINAL_ANSWER_ACTION {
        Some(AgentAction::FinalAnswer(input))
    } else {
        Some(AgentAction::Tool {
            name: parsed.action,
            input,
        })
    }
}

/// Locate the JSON object in the reply: the content of a code fence when one
/// is present, otherwise the outermost `{ .. }` span.
fn extract_json_blob(reply: &str) -> Option<&str> {
    let body = match reply.split("```").nth(1) {
        Some(fenced) => fenced.strip_prefix("json").unwrap_or(fenced),
        None => reply,
    };
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}
