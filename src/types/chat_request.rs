use serde::{Deserialize, Serialize};

/// Body of a chat-send request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Thread the message belongs to.
    pub thread_id: String,

    /// The user's message.
    pub message: String,

    /// Whether the assistant should answer in JSON.  Always false for this client.
    pub json_response: bool,
}

impl ChatRequest {
    /// Creates a new chat request for the given thread.
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message: message.into(),
            json_response: false,
        }
    }
}
