//! Parsing of the model's plugin selection
//!
//! Models often wrap their JSON in code fences and spread it over several
//! lines, so the reply is scrubbed before a strict decode.

use crate::error::DispatchError;
use crate::plugins::Args;
use serde::Deserialize;
use serde_json::Value;

/// Fence markers removed during cleanup; longest first
const FENCES: &[&str] = &["```json", "```JSON", "```", "'''"];

/// What the model chose
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected { plugin: String, args: Args },
    NoSelection,
}

/// Wire shape of a selection reply
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SelectionReply {
    #[serde(default)]
    plugin: Option<String>,
    #[serde(default)]
    args: Option<Args>,
}

/// Remove raw newlines and fence markers
pub fn cleanup(reply: &str) -> String {
    let mut cleaned: String = reply.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    for fence in FENCES {
        cleaned = cleaned.replace(fence, "");
    }
    cleaned.trim().to_string()
}

/// Decode a raw model reply
pub fn parse(reply: &str) -> Result<SelectionOutcome, DispatchError> {
    let cleaned = cleanup(reply);

    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| DispatchError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(DispatchError::Decode(format!(
            "expected a json object, got: {}",
            cleaned
        )));
    }

    let reply: SelectionReply =
        serde_json::from_value(value).map_err(|e| DispatchError::Decode(e.to_string()))?;

    match reply.plugin {
        Some(plugin) if !plugin.is_empty() => Ok(SelectionOutcome::Selected {
            plugin,
            args: reply.args.unwrap_or_default(),
        }),
        _ => Ok(SelectionOutcome::NoSelection),
    }
}
