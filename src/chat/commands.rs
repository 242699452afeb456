//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session and is never sent to the assistant.

/// Questions offered to a user who does not know where to start.
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "¿Cuáles son los requisitos para participar en una licitación pública?",
    "¿Qué plazos debo considerar para presentar una impugnación?",
    "¿Cuáles son las causales de nulidad en un proceso de contratación?",
];

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new thread.
    New,

    /// Show the current thread, or switch to the given one.
    Thread(Option<String>),

    /// List the suggested questions.
    Questions,

    /// Send the suggested question with this zero-based index.
    Ask(usize),

    /// Show today's question count.
    Count,

    /// Print the cleaned text of the last reply.
    Copy,

    /// Toggle verbatim display of replies.
    Raw,

    /// Sign in.
    Login { email: String, password: String },

    /// Sign out.
    Logout,

    /// Show the signed-in user.
    WhoAmI,

    /// Clear the conversation history.
    Clear,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it should be sent
/// as a regular message.
///
/// # Examples
///
/// ```
/// # use interpretalex::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/ask 2"), Some(ChatCommand::Ask(1)));
/// assert!(parse_command("¿Qué es una adenda?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "thread" => ChatCommand::Thread(argument.map(|s| s.to_string())),
        "questions" | "suggest" => ChatCommand::Questions,
        "ask" => parse_ask(argument),
        "count" => ChatCommand::Count,
        "copy" => ChatCommand::Copy,
        "raw" => ChatCommand::Raw,
        "login" => parse_login(argument),
        "logout" => ChatCommand::Logout,
        "whoami" => ChatCommand::WhoAmI,
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_ask(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/ask requires a question number".to_string());
    };
    match arg.parse::<usize>() {
        Ok(n) if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) => ChatCommand::Ask(n - 1),
        _ => ChatCommand::Invalid(format!(
            "/ask expects a number between 1 and {}",
            SUGGESTED_QUESTIONS.len()
        )),
    }
}

fn parse_login(argument: Option<&str>) -> ChatCommand {
    let mut parts = argument.unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(email), Some(password), None) if email.contains('@') => ChatCommand::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        _ => ChatCommand::Invalid("/login expects <email> <password>".to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new conversation thread
  /thread [id]           Show the current thread, or switch to another
  /questions             List suggested questions
  /ask <n>               Send suggested question n
  /count                 Show how many questions were asked today
  /copy                  Print the last reply without citation markers
  /raw                   Toggle verbatim display of replies
  /login <email> <pass>  Sign in
  /logout                Sign out
  /whoami                Show the signed-in user
  /clear                 Clear conversation history
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_thread() {
        assert_eq!(parse_command("/thread"), Some(ChatCommand::Thread(None)));
        assert_eq!(
            parse_command("/thread   thread_abc "),
            Some(ChatCommand::Thread(Some("thread_abc".to_string())))
        );
        assert_eq!(parse_command("/new"), Some(ChatCommand::New));
    }

    #[test]
    fn parse_ask() {
        assert_eq!(parse_command("/ask 1"), Some(ChatCommand::Ask(0)));
        assert_eq!(parse_command("/ask 3"), Some(ChatCommand::Ask(2)));
        assert!(matches!(
            parse_command("/ask 0"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/ask 4"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/ask uno"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(parse_command("/ask"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn parse_login() {
        assert_eq!(
            parse_command("/login ana@estudio.pe secreto"),
            Some(ChatCommand::Login {
                email: "ana@estudio.pe".to_string(),
                password: "secreto".to_string(),
            })
        );
        assert!(matches!(
            parse_command("/login ana@estudio.pe"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/login ana secreto"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/login a@b c d"),
            Some(ChatCommand::Invalid(_))
        ));
        assert_eq!(parse_command("/logout"), Some(ChatCommand::Logout));
        assert_eq!(parse_command("/whoami"), Some(ChatCommand::WhoAmI));
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("/questions"), Some(ChatCommand::Questions));
        assert_eq!(parse_command("/count"), Some(ChatCommand::Count));
        assert_eq!(parse_command("/copy"), Some(ChatCommand::Copy));
        assert_eq!(parse_command("/raw"), Some(ChatCommand::Raw));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert!(parse_command("Hola").is_none());
        assert!(parse_command("¿Plazo de 8/10 días?").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn help_text_lists_every_command() {
        let help = help_text();
        for command in [
            "/new", "/thread", "/questions", "/ask", "/count", "/copy", "/raw", "/login",
            "/logout", "/whoami", "/clear", "/help", "/quit",
        ] {
            assert!(help.contains(command), "{command} missing from help");
        }
    }
}
