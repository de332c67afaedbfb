//! Tool invocation fingerprints
//!
//! A fingerprint captures "what was asked": the tool identity and its input
//! parameters, never the result. Re-running the same query with a different
//! answer must still produce the same fingerprint.

use super::classify::parse_payload;
use super::RESULT_KEY;
use crate::engine::{Content, Message};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// A tool call observed in the engine's output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// Input parameters; `Null` when none could be recovered
    pub params: Value,
    pub result: Content,
}

impl ToolInvocation {
    /// Build from a tool message. Non-tool messages yield `None`.
    ///
    /// Parameters come from the engine-reported tool input when present,
    /// otherwise from the non-`result` keys the tool echoed into its payload.
    pub fn from_message(message: &Message) -> Option<Self> {
        if !message.is_tool() {
            return None;
        }

        let params = match &message.tool_input {
            Some(input) => input.clone(),
            None => echoed_params(&message.content),
        };

        Some(Self {
            tool_name: message.tool_name.clone().unwrap_or_default(),
            params,
            result: message.content.clone(),
        })
    }
}

fn echoed_params(content: &Content) -> Value {
    match parse_payload(content) {
        Some(Value::Object(map)) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != RESULT_KEY)
                .collect::<Map<_, _>>(),
        ),
        _ => Value::Null,
    }
}

/// Order-independent signature of a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint {
    tool: String,
    params: Vec<(String, String)>,
}

impl Fingerprint {
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Short hex id for logs and trace text
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tool.as_bytes());
        for (key, value) in &self.params {
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
        }
        format!("{:x}", hasher.finalize()).chars().take(12).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.tool)?;
        for (i, (key, value)) in self.params().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str(")")
    }
}

/// Fingerprint a tool invocation. Total: unusable parameters degrade to an
/// empty parameter list.
pub fn fingerprint(invocation: &ToolInvocation) -> Fingerprint {
    let mut params = param_pairs(&invocation.params);
    params.sort();
    Fingerprint {
        tool: invocation.tool_name.clone(),
        params,
    }
}

fn param_pairs(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() != RESULT_KEY)
            .map(|(key, value)| (key.clone(), stringify(value)))
            .collect(),
        // Some engines report arguments as a JSON string
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Object(_)) => param_pairs(&parsed),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
