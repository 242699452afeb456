//! Interactive chat with the InterpretaLex legal assistant.
//!
//! # Usage
//!
//! ```bash
//! # Against a local backend, key from $INTERPRETALEX_API_KEY
//! interpretalex-chat
//!
//! # Remember the thread and the daily counter between runs
//! interpretalex-chat --store ~/.interpretalex.json
//!
//! # Settings from a YAML file; flags override it
//! interpretalex-chat --config lex.yaml --no-color
//! ```
//!
//! Type `/help` at the prompt for the list of slash commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use interpretalex::auth::Credentials;
use interpretalex::chat::{
    ChatArgs, ChatCommand, ChatConfig, ConversationSession, PlainTextRenderer, Renderer,
    SUGGESTED_QUESTIONS, SendOutcome, help_text, parse_command,
};
use interpretalex::format::{format, needs_formatting, strip_references};
use interpretalex::store::{JsonFileStore, KeyValueStore, MemoryStore};
use interpretalex::{InterpretaLex, StderrLogger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("interpretalex-chat [OPTIONS]");
    let config = ChatConfig::resolve(args)?;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let mut client = InterpretaLex::with_options(
        config.api_key.clone(),
        Some(config.api_url.clone()),
        config.auth_url.clone(),
        Some(config.timeout),
    )?;
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    let client = Arc::new(client);

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => Arc::new(JsonFileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    let credentials = Credentials::new(client.clone(), store.clone());
    let session = ConversationSession::open(client, store).await?;
    let mut raw = false;

    let mut rl = DefaultEditor::new()?;

    // The request always runs to completion; Ctrl+C only discards its reply.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("InterpretaLex (thread: {})", session.thread_id().unwrap_or_default());
    println!(
        "{} consultas realizadas hoy",
        session.question_count_today()?
    );
    println!("Type /questions for suggestions, /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("Tú: ");

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\n¡Hasta luego!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        let Some(cmd) = parse_command(line) else {
            send(&session, line, raw, &interrupted, &mut renderer).await;
            continue;
        };
        match cmd {
            ChatCommand::Quit => {
                println!("¡Hasta luego!");
                break;
            }
            ChatCommand::Help => {
                for line in help_text().lines() {
                    println!("    {line}");
                }
            }
            ChatCommand::New => match session.new_thread().await {
                Ok(id) => renderer.print_info(&format!("New thread: {id}")),
                Err(err) => renderer.print_error(&format!("Error al crear el chat: {err}")),
            },
            ChatCommand::Thread(None) => match session.thread_id() {
                Some(id) => renderer.print_info(&format!("Current thread: {id}")),
                None => renderer.print_info("No active thread."),
            },
            ChatCommand::Thread(Some(id)) => match session.set_thread(&id) {
                Ok(()) => renderer.print_info(&format!("Switched to thread {id}")),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            ChatCommand::Questions => {
                for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
                    println!("    {}. {question}", i + 1);
                }
            }
            ChatCommand::Ask(index) => {
                let question = SUGGESTED_QUESTIONS[index];
                println!("Tú: {question}");
                send(&session, question, raw, &interrupted, &mut renderer).await;
            }
            ChatCommand::Count => match session.question_count_today() {
                Ok(count) => renderer.print_info(&format!("{count} consultas realizadas hoy")),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            ChatCommand::Copy => match session.last_assistant_message() {
                Some(message) => renderer.print_raw(&strip_references(&message.content)),
                None => renderer.print_info("No reply to copy yet."),
            },
            ChatCommand::Raw => {
                raw = !raw;
                if raw {
                    renderer.print_info("Replies are shown verbatim.");
                } else {
                    renderer.print_info("Replies are formatted.");
                }
            }
            ChatCommand::Login { email, password } => {
                match credentials.login(&email, &password).await {
                    Ok(user) => renderer.print_info(&format!("Signed in as {}", user.name)),
                    Err(err) => renderer.print_error(&format!("Login failed: {err}")),
                }
            }
            ChatCommand::Logout => match credentials.logout().await {
                Ok(server_error) => {
                    if let Some(err) = server_error {
                        renderer.print_error(&format!("Error al cerrar sesión: {err}"));
                    }
                    renderer.print_info("Signed out.");
                }
                Err(err) => renderer.print_error(&err.to_string()),
            },
            ChatCommand::WhoAmI => match credentials.current_user() {
                Ok(Some(user)) => renderer.print_info(&format!("{} <{}>", user.name, user.email)),
                Ok(None) => renderer.print_info("Not signed in."),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            ChatCommand::Clear => {
                session.clear();
                renderer.print_info("Conversation cleared.");
            }
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
    }

    Ok(())
}

async fn send(
    session: &ConversationSession,
    text: &str,
    raw: bool,
    interrupted: &AtomicBool,
    renderer: &mut PlainTextRenderer,
) {
    renderer.start_typing();
    let outcome = session.send(text).await;
    renderer.finish_typing();
    if interrupted.load(Ordering::Relaxed) {
        renderer.print_info("[interrupted]");
        return;
    }
    match outcome {
        Ok(SendOutcome::Replied(reply)) => {
            if raw || !needs_formatting(&reply.content) {
                renderer.print_raw(&reply.content);
            } else {
                renderer.print_formatted(&format(&reply.content));
            }
        }
        Ok(SendOutcome::Busy) => renderer.print_info("Still waiting for the previous reply."),
        Ok(SendOutcome::Empty) | Ok(SendOutcome::Ignored) => {}
        Err(err) if err.is_transport() => {
            renderer.print_error(&format!("Error al enviar el mensaje: {err}"))
        }
        Err(err) => renderer.print_error(&err.to_string()),
    }
}
