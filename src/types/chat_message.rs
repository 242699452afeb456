use serde::{Deserialize, Serialize};

/// A message in a conversation held by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Identifier of the message.
    ///
    /// Assistant messages use the id from the stream metadata when one was sent.
    pub id: String,

    /// Who authored the message.
    pub role: MessageRole,

    /// The raw message text as received (escaped newlines are kept).
    pub content: String,
}

/// Role type for a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl ChatMessage {
    /// Create a new `ChatMessage`.
    pub fn new(id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, MessageRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, MessageRole::Assistant, content)
    }

    /// Returns true if the assistant wrote this message.
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let message = ChatMessage::assistant("m1", "Hola");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "m1", "role": "assistant", "content": "Hola"})
        );
    }

    #[test]
    fn constructors_set_role() {
        assert!(ChatMessage::assistant("a", "x").is_assistant());
        assert!(!ChatMessage::user("u", "x").is_assistant());
    }
}
