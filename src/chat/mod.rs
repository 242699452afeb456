//! Chat application module for conversations with the InterpretaLex assistant.
//!
//! This module provides the pieces of the `interpretalex-chat` REPL:
//!
//! - [`config`]: CLI argument parsing, YAML configuration
//! - [`session`]: conversation state and the send flow
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, SUGGESTED_QUESTIONS, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ConversationSession, SendOutcome};
