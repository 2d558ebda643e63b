//! UI-agnostic conversation state types
//!
//! These records are shared by every front end and don't depend on any
//! specific UI framework.

use serde::{Deserialize, Serialize};

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Reasoning text the model emitted before its answer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thinking: None,
        }
    }

    /// Build an assistant message. An empty thinking segment is stored as `None`.
    pub fn assistant(content: impl Into<String>, thinking: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            thinking: thinking.filter(|t| !t.is_empty()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            thinking: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_drops_empty_thinking() {
        let msg = Message::assistant("answer", Some(String::new()));
        assert_eq!(msg.thinking, None);

        let msg = Message::assistant("answer", Some("reasoning".to_string()));
        assert_eq!(msg.thinking.as_deref(), Some("reasoning"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
