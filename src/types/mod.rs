// Public modules
pub mod chat_message;
pub mod chat_request;
pub mod thread;
pub mod user;

// Re-exports
pub use chat_message::{ChatMessage, MessageRole};
pub use chat_request::ChatRequest;
pub use thread::{CreateThreadRequest, Thread, ThreadResponse};
pub use user::{LoginRequest, LoginResponse, User};
