use crate::state::{Message, Role};

/// Greeting the session is seeded with
pub const GREETING: &str = "Hi! I'm your Code Companion. How can I help you code today? 💻";

/// Chronological, append-only record of the conversation.
///
/// Lives only as long as the interactive session; nothing is written to disk.
#[derive(Debug, Clone)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    /// A session seeded with the assistant greeting
    pub fn new() -> Self {
        Self::with_seed(vec![Message::assistant(GREETING, None)])
    }

    pub fn with_seed(seed: Vec<Message>) -> Self {
        Self { messages: seed }
    }

    pub fn push(&mut self, message: Message) {
        tracing::debug!(role = message.role.as_str(), len = self.messages.len() + 1, "session append");
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, thinking: Option<String>) {
        self.push(Message::assistant(content, thinking));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_seeded_with_greeting() {
        let session = Session::new();
        assert_eq!(session.len(), 1);
        let first = &session.messages()[0];
        assert_eq!(first.role, Role::Assistant);
        assert_eq!(first.content, GREETING);
        assert_eq!(first.thinking, None);
    }

    #[test]
    fn test_length_grows_by_two_per_exchange() {
        let mut session = Session::new();
        let seed = session.len();

        for k in 1..=4 {
            session.push_user(format!("question {}", k));
            session.push_assistant(format!("answer {}", k), None);
            assert_eq!(session.len(), seed + 2 * k);
        }
        assert_eq!(session.count_role(Role::User), 4);
        assert_eq!(session.count_role(Role::Assistant), 5);
    }

    #[test]
    fn test_order_is_chronological() {
        let mut session = Session::with_seed(Vec::new());
        session.push_user("first");
        session.push_assistant("second", Some("why".to_string()));
        session.push_user("third");

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(session.last().map(|m| m.role), Some(Role::User));
    }
}
