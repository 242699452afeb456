//! Logging trait for InterpretaLex client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log the API interactions passing through the [`InterpretaLex`](crate::InterpretaLex)
//! client.

use crate::stream::{DecodedMessage, MetadataError};
use crate::types::{ChatRequest, ThreadResponse};

/// A trait for logging client operations.
///
/// Every method has an empty default, so implementors only override what they record.
///
/// # Example
///
/// ```rust,ignore
/// use interpretalex::{ClientLogger, MetadataError};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_metadata_error(&self, error: &MetadataError) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "bad metadata frame on line {}: {}", error.line, error.message).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log the envelope returned by the thread-creation endpoint.
    fn log_thread_response(&self, response: &ThreadResponse) {
        _ = response;
    }

    /// Log the raw body of a chat response, exactly as received.
    fn log_chat_body(&self, request: &ChatRequest, body: &str) {
        _ = request;
        _ = body;
    }

    /// Log the decoded chat response.
    fn log_decoded_message(&self, request: &ChatRequest, message: &DecodedMessage) {
        _ = request;
        _ = message;
    }

    /// Log a metadata frame that failed to parse.
    ///
    /// Called once per malformed frame, after [`ClientLogger::log_decoded_message`].
    fn log_metadata_error(&self, error: &MetadataError) {
        _ = error;
    }

    /// Log a failed request.
    fn log_request_error(&self, endpoint: &str, error: &crate::Error) {
        _ = endpoint;
        _ = error;
    }
}

/// A logger that writes one line per event to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl ClientLogger for StderrLogger {
    fn log_thread_response(&self, response: &ThreadResponse) {
        match &response.data {
            Some(thread) => eprintln!("[interpretalex] thread created: {}", thread.id),
            None => eprintln!(
                "[interpretalex] thread creation failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn log_decoded_message(&self, request: &ChatRequest, message: &DecodedMessage) {
        eprintln!(
            "[interpretalex] thread {}: {} content frames, {} metadata frames, {} chars, id {:?}",
            request.thread_id,
            message.stats.content,
            message.stats.metadata,
            message.text.chars().count(),
            message.message_id
        );
    }

    fn log_metadata_error(&self, error: &MetadataError) {
        eprintln!(
            "[interpretalex] malformed metadata frame on line {}: {}",
            error.line, error.message
        );
    }

    fn log_request_error(&self, endpoint: &str, error: &crate::Error) {
        eprintln!("[interpretalex] {endpoint} failed: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        errors: Mutex<Vec<usize>>,
    }

    impl ClientLogger for Recording {
        fn log_metadata_error(&self, error: &MetadataError) {
            self.errors.lock().unwrap().push(error.line);
        }
    }

    #[test]
    fn defaults_are_no_ops() {
        let logger = Recording::default();
        let request = ChatRequest::new("t", "m");
        logger.log_chat_body(&request, "0:\"x\"");
        logger.log_decoded_message(&request, &DecodedMessage::default());
        logger.log_metadata_error(&MetadataError {
            line: 3,
            message: "expected value".to_string(),
        });
        assert_eq!(*logger.errors.lock().unwrap(), vec![3]);
    }
}
