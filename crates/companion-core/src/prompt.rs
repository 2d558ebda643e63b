//! Turns the conversation history into the instruction sequence sent to the
//! chat-completion API.

use serde::Serialize;

use crate::state::{Message, Role};

pub const SYSTEM_PROMPT: &str = "You are an expert AI coding assistant. Provide concise, correct solutions \
with strategic print statements for debugging. Always respond in English.";

/// One entry of the `messages` array on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

pub fn build_prompt(history: &[Message]) -> Vec<PromptMessage> {
    build_prompt_with(SYSTEM_PROMPT, history)
}

/// System instruction first, then one entry per message in order.
///
/// Content is copied verbatim and thinking segments are never replayed.
pub fn build_prompt_with(system: &str, history: &[Message]) -> Vec<PromptMessage> {
    let mut prompt = Vec::with_capacity(history.len() + 1);
    prompt.push(PromptMessage {
        role: Role::System,
        content: system.to_string(),
    });

    for msg in history {
        prompt.push(PromptMessage {
            role: msg.role,
            content: msg.content.clone(),
        });
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Message> {
        vec![
            Message::assistant("Hi! How can I help?", None),
            Message::user("Why does my loop never end?"),
            Message::assistant("Increment the counter.", Some("The counter is never updated.".to_string())),
            Message::user("Thanks"),
        ]
    }

    #[test]
    fn test_prompt_length_is_history_plus_one() {
        let history = history();
        let prompt = build_prompt(&history);
        assert_eq!(prompt.len(), history.len() + 1);
        assert!(build_prompt(&[]).len() == 1);
    }

    #[test]
    fn test_system_instruction_comes_first() {
        let prompt = build_prompt(&history());
        assert_eq!(prompt[0].role, Role::System);
        assert_eq!(prompt[0].content, SYSTEM_PROMPT);
    }

    #[test]
    fn test_order_and_roles_preserved() {
        let history = history();
        let prompt = build_prompt(&history);
        for (msg, entry) in history.iter().zip(prompt.iter().skip(1)) {
            assert_eq!(entry.role, msg.role);
            assert_eq!(entry.content, msg.content);
        }
    }

    #[test]
    fn test_thinking_is_not_replayed() {
        let prompt = build_prompt(&history());
        assert!(prompt.iter().all(|p| !p.content.contains("never updated")));
    }

    #[test]
    fn test_content_passes_through_verbatim() {
        let raw = "fn main() { println!(\"{}\", x); } {{not a template}}";
        let prompt = build_prompt_with("sys", &[Message::user(raw)]);
        assert_eq!(prompt[1].content, raw);
    }

    #[test]
    fn test_wire_format() {
        let prompt = build_prompt_with("sys", &[Message::user("hi")]);
        let json = serde_json::to_value(&prompt).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hi"}
            ])
        );
    }
}
