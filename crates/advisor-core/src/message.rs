//! Conversation messages and their parts
//!
//! A `Message` is one immutable turn of the conversation. Its `parts` are
//! ordered; the order reflects render and causal order within the turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::rich::RichContent;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Model,
    ToolLog,
}

/// One element of a message: text, a tool invocation record, a tool result
/// record, or a structured rich-content payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Part {
    Text { text: String },
    ToolCall { name: String, args: Value },
    ToolResult { name: String, response: Value },
    RichContent { payload: RichContent },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn tool_call(name: impl Into<String>, args: Value) -> Self {
        Part::ToolCall {
            name: name.into(),
            args,
        }
    }

    pub fn tool_result(name: impl Into<String>, response: Value) -> Self {
        Part::ToolResult {
            name: name.into(),
            response,
        }
    }

    /// Tool name, if this part records a call or a result
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Part::ToolCall { name, .. } | Part::ToolResult { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// An immutable record of one turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    pub timestamp: DateTime<Utc>,
    /// Free-form diagnostic attributes (latency, token count, ...).
    /// Never semantically required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    /// Create a message with the given role and parts
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// A user message holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// A model message
    pub fn model(parts: Vec<Part>) -> Self {
        Self::new(Role::Model, parts)
    }

    /// A tool-log message carrying the results of one tool round
    pub fn tool_log(parts: Vec<Part>) -> Self {
        Self::new(Role::ToolLog, parts)
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Names of the tool calls requested in this message, in request order
    pub fn tool_call_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolCall { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "hello");
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn test_part_serialization_tags() {
        let part = Part::tool_call("get_summary", json!({}));
        let v = serde_json::to_value(&part).unwrap();
        assert_eq!(v["kind"], "tool-call");
        assert_eq!(v["name"], "get_summary");

        let back: Part = serde_json::from_value(v).unwrap();
        assert_eq!(back.tool_name(), Some("get_summary"));
    }

    #[test]
    fn test_tool_call_names_preserve_order() {
        let msg = Message::model(vec![
            Part::text("checking"),
            Part::tool_call("a", json!({})),
            Part::tool_call("b", json!({})),
        ]);
        assert_eq!(msg.tool_call_names(), vec!["a", "b"]);
    }
}
