// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod format;
pub mod render;
pub mod store;
pub mod stream;
pub mod types;

mod observability;

// Re-exports
pub use auth::Credentials;
pub use client::{AssistantTransport, AuthTransport, InterpretaLex};
pub use client_logger::{ClientLogger, StderrLogger};
pub use error::{Error, Result};
pub use format::{FormattedMessage, format, needs_formatting};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use stream::{DecodedMessage, FrameDecoder, MetadataError, decode};
pub use types::*;
