//! Decoder for the assistant's line-delimited response stream.
//!
//! A chat response body is a sequence of newline-terminated frames.  Each frame starts
//! with a short tag:
//!
//! - `0:` carries a piece of the reply text, usually wrapped in double quotes;
//! - `5:` carries a JSON metadata record, of which only `messageId` is used;
//! - anything else is ignored.
//!
//! The decoder reduces all frames of one response into a [`DecodedMessage`].  It never
//! fails: malformed metadata frames are recorded in
//! [`DecodedMessage::metadata_errors`] and skipped.
//!
//! ```
//! use interpretalex::stream::decode;
//!
//! let decoded = decode("5:{\"messageId\":\"m1\"}\n0:\"Hola \"\n0:\"mundo\"");
//! assert_eq!(decoded.message_id, "m1");
//! assert_eq!(decoded.text, "Hola mundo");
//! ```

use serde::Serialize;

/// Tag prefix of a content frame.
pub const CONTENT_TAG: &str = "0:";

/// Tag prefix of a metadata frame.
pub const METADATA_TAG: &str = "5:";

/// One line of the response stream, classified by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A piece of reply text, exactly as it appears after the tag.
    Content(&'a str),
    /// A metadata record, exactly as it appears after the tag.
    Metadata(&'a str),
    /// A line with no known tag.
    Other(&'a str),
}

impl<'a> Frame<'a> {
    /// Classifies a single line (without its terminating newline).
    pub fn parse(line: &'a str) -> Self {
        if let Some(payload) = line.strip_prefix(CONTENT_TAG) {
            Frame::Content(payload)
        } else if let Some(payload) = line.strip_prefix(METADATA_TAG) {
            Frame::Metadata(payload)
        } else {
            Frame::Other(line)
        }
    }
}

/// A metadata frame that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataError {
    /// One-based line number of the frame within the response.
    pub line: usize,
    /// Parser diagnostic.
    pub message: String,
}

/// Frame counts observed while decoding a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Number of `0:` frames.
    pub content: usize,
    /// Number of `5:` frames, including malformed ones.
    pub metadata: usize,
    /// Number of non-empty lines without a known tag.
    pub ignored: usize,
}

/// The reduction of every frame in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedMessage {
    /// Identifier from the last metadata frame that carried one; empty if none did.
    pub message_id: String,
    /// Concatenated, quote-stripped content payloads in frame order.
    pub text: String,
    /// Metadata frames that failed to parse.
    pub metadata_errors: Vec<MetadataError>,
    /// Frame counts.
    pub stats: FrameStats,
}

impl DecodedMessage {
    /// Returns true if the response carried no text.
    ///
    /// An empty response must not produce an assistant message.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the message id, or `None` if the stream did not provide one.
    pub fn message_id(&self) -> Option<&str> {
        if self.message_id.is_empty() {
            None
        } else {
            Some(&self.message_id)
        }
    }
}

/// Incremental decoder that accepts the response body in arbitrary chunks.
///
/// Lines and multi-byte characters may be split across chunks; the decoder buffers the
/// unterminated tail until the next chunk or [`FrameDecoder::finish`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    line: usize,
    decoded: DecodedMessage,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the response body.
    pub fn push(&mut self, chunk: &[u8]) {
        let mut start = self.pending.len();
        self.pending.extend_from_slice(chunk);
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            self.process_line(&line[..line.len() - 1]);
            start = 0;
        }
    }

    /// Feeds a chunk of the response body that is already text.
    pub fn push_str(&mut self, chunk: &str) {
        self.push(chunk.as_bytes());
    }

    /// Returns the text accumulated so far.
    pub fn text(&self) -> &str {
        &self.decoded.text
    }

    /// Flushes the final unterminated line and returns the decoded message.
    pub fn finish(mut self) -> DecodedMessage {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.process_line(&line);
        }
        self.decoded
    }

    fn process_line(&mut self, bytes: &[u8]) {
        self.line += 1;
        let line = String::from_utf8_lossy(bytes);
        let line = line.strip_suffix('\r').unwrap_or(&line);
        match Frame::parse(line) {
            Frame::Content(payload) => {
                self.decoded.stats.content += 1;
                self.decoded.text.push_str(strip_quotes(payload));
            }
            Frame::Metadata(payload) => {
                self.decoded.stats.metadata += 1;
                match serde_json::from_str::<serde_json::Value>(payload) {
                    Ok(record) => {
                        if let Some(id) = message_id_of(&record) {
                            self.decoded.message_id = id;
                        }
                    }
                    Err(err) => self.decoded.metadata_errors.push(MetadataError {
                        line: self.line,
                        message: err.to_string(),
                    }),
                }
            }
            Frame::Other(other) => {
                if !other.is_empty() {
                    self.decoded.stats.ignored += 1;
                }
            }
        }
    }
}

/// Decodes a complete response body.
///
/// This is a pure function: the same input always yields the same output.
pub fn decode(raw: &str) -> DecodedMessage {
    let mut decoder = FrameDecoder::new();
    decoder.push_str(raw);
    decoder.finish()
}

/// Strips one pair of enclosing double quotes, if both are present.
fn strip_quotes(payload: &str) -> &str {
    if payload.len() >= 2 && payload.starts_with('"') && payload.ends_with('"') {
        &payload[1..payload.len() - 1]
    } else {
        payload
    }
}

fn message_id_of(record: &serde_json::Value) -> Option<String> {
    match record.get("messageId")? {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
