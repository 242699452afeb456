//! Terminal rendering of formatted replies.
//!
//! The formatter produces plain data; a [`Renderer`] decides how it looks.
//! [`PlainTextRenderer`] writes to stdout with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::format::{ContentCategory, FormattedMessage, Icon, InlineSpan, Segment};

/// ANSI escape code for bold text (used for bold spans and list ordinals).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for underlined text (used for legal terms).
const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_BLUE: &str = "\x1b[34m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RED: &str = "\x1b[31m";

/// ANSI sequence that returns to column 0 and erases the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

const TYPING_INDICATOR: &str = "InterpretaLex está escribiendo…";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a formatted assistant reply.
    fn print_formatted(&mut self, message: &FormattedMessage);

    /// Print a reply verbatim.
    fn print_raw(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a message has been sent and the reply is pending.
    fn start_typing(&mut self) {}

    /// Called when the reply has arrived or the send failed.
    fn finish_typing(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    typing: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            typing: false,
        }
    }

    /// Renders `message` into a string exactly as [`Renderer::print_formatted`] prints
    /// it, without the trailing newline.
    pub fn render_to_string(&self, message: &FormattedMessage) -> String {
        let mut out = String::new();
        let glyph = icon_glyph(message.icon());
        if self.use_color {
            let color = category_color(message.category);
            out.push_str(&format!(
                "{ANSI_BOLD}{color}{glyph} {}{ANSI_RESET}\n",
                message.label()
            ));
        } else {
            out.push_str(&format!("{glyph} {}\n", message.label()));
        }

        for (index, segment) in message.segments.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            match segment {
                Segment::ListItem { ordinal, spans } => {
                    out.push_str("  ");
                    if self.use_color {
                        out.push_str(&format!("{ANSI_BOLD}{ordinal}{ANSI_RESET} "));
                    } else {
                        out.push_str(&format!("{ordinal} "));
                    }
                    self.write_spans(&mut out, spans, false);
                }
                Segment::Paragraph { spans, .. } => self.write_spans(&mut out, spans, false),
            }
        }
        out
    }

    /// Appends `spans` to `out`; `in_bold` restores bold after a nested reset.
    fn write_spans(&self, out: &mut String, spans: &[InlineSpan], in_bold: bool) {
        for span in spans {
            match span {
                InlineSpan::Plain { text } => out.push_str(text),
                InlineSpan::Bold { children } => {
                    if self.use_color {
                        out.push_str(ANSI_BOLD);
                        self.write_spans(out, children, true);
                        out.push_str(ANSI_RESET);
                        if in_bold {
                            out.push_str(ANSI_BOLD);
                        }
                    } else {
                        self.write_spans(out, children, in_bold);
                    }
                }
                InlineSpan::Term { text, .. } => {
                    if self.use_color {
                        out.push_str(&format!("{ANSI_UNDERLINE}{ANSI_YELLOW}{text}{ANSI_RESET}"));
                        if in_bold {
                            out.push_str(ANSI_BOLD);
                        }
                    } else {
                        out.push_str(text);
                    }
                }
            }
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn clear_typing(&mut self) {
        if self.typing {
            if self.use_color {
                print!("{ANSI_CLEAR_LINE}");
            } else {
                println!();
            }
            self.typing = false;
            self.flush();
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_formatted(&mut self, message: &FormattedMessage) {
        self.clear_typing();
        let rendered = self.render_to_string(message);
        println!("{rendered}");
        self.flush();
    }

    fn print_raw(&mut self, text: &str) {
        self.clear_typing();
        println!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_typing();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.clear_typing();
        println!("{info}");
        self.flush();
    }

    fn start_typing(&mut self) {
        if self.typing {
            return;
        }
        if self.use_color {
            print!("{ANSI_DIM}{TYPING_INDICATOR}{ANSI_RESET}");
        } else {
            print!("{TYPING_INDICATOR}");
        }
        self.typing = true;
        self.flush();
    }

    fn finish_typing(&mut self) {
        self.clear_typing();
    }
}

/// Terminal glyph for a category icon.
pub fn icon_glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Book => "§",
        Icon::Triangle => "⚠",
        Icon::Info => "ℹ",
        Icon::Check => "✓",
    }
}

fn category_color(category: ContentCategory) -> &'static str {
    match category {
        ContentCategory::LegalNorm => ANSI_BLUE,
        ContentCategory::Warning => ANSI_YELLOW,
        ContentCategory::Advice => ANSI_GREEN,
        ContentCategory::Informational => ANSI_CYAN,
    }
}
