//! Transcript types shared with the engine

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// Message content: plain text or an already structured payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(Value),
}

impl Content {
    /// Render as text; structured payloads become compact JSON
    pub fn to_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

/// A transcript message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    /// Tool identity, for tool-originated messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Arguments the engine passed to the tool, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
}

impl Message {
    fn new(role: Role, content: Content) -> Self {
        Self {
            role,
            content,
            tool_name: None,
            tool_input: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Content::Text(text.into()))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Content::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Content::Text(text.into()))
    }

    pub fn tool(name: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            tool_name: Some(name.into()),
            ..Self::new(Role::Tool, content.into())
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_tool_input(mut self, input: Value) -> Self {
        self.tool_input = Some(input);
        self
    }

    pub fn is_tool(&self) -> bool {
        self.role == Role::Tool
    }
}

/// Everything the engine produced for one invocation, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub messages: Vec<Message>,
}

impl EngineOutput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// First tool-originated message, if any
    pub fn first_tool_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_tool())
    }

    pub fn tool_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_tool()).count()
    }

    /// Text of the last assistant message
    pub fn final_answer(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.to_text())
    }
}
