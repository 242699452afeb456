//! Conversation state.
//!
//! [`ConversationSession`] owns what the chat view needs between messages: the active
//! thread, the message history, the busy flag and the per-day question counter.  The
//! stream decoder and the formatter stay stateless; the session feeds them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;

use crate::client::AssistantTransport;
use crate::error::Result;
use crate::observability::{
    SESSION_BUSY_REJECTIONS, SESSION_EMPTY_REPLIES, SESSION_SEND_ERRORS, SESSION_SENDS,
};
use crate::store::{CURRENT_THREAD_KEY, KeyValueStore, question_count_key, today};
use crate::types::ChatMessage;

/// What happened to a message passed to [`ConversationSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The input was blank; nothing was sent.
    Ignored,
    /// Another send was in flight; nothing was sent.
    Busy,
    /// The assistant answered with no text; no reply was recorded.
    Empty,
    /// The assistant's reply, already appended to the history.
    Replied(ChatMessage),
}

#[derive(Debug, Default)]
struct SessionState {
    thread_id: Option<String>,
    messages: Vec<ChatMessage>,
    last_error: Option<String>,
}

/// A conversation with the assistant.
///
/// All methods take `&self`, so a session can be shared behind an `Arc`; the busy flag
/// rejects a send that arrives while another is outstanding.
///
/// ```
/// # use std::sync::Arc;
/// # use interpretalex::{AssistantTransport, DecodedMessage, MemoryStore, Result, Thread, decode};
/// # use interpretalex::chat::{ConversationSession, SendOutcome};
/// # struct Canned;
/// # #[async_trait::async_trait]
/// # impl AssistantTransport for Canned {
/// #     async fn create_thread(&self) -> Result<Thread> {
/// #         Ok(Thread { id: "thread_1".into(), created_at: None, metadata: Default::default() })
/// #     }
/// #     async fn send_chat(&self, _: &str, _: &str) -> Result<DecodedMessage> {
/// #         Ok(decode("5:{\"messageId\":\"m1\"}\n0:\"Hola\""))
/// #     }
/// # }
/// # tokio_test::block_on(async {
/// let session = ConversationSession::open(Arc::new(Canned), Arc::new(MemoryStore::new())).await?;
/// let SendOutcome::Replied(reply) = session.send("Buenos días").await? else {
///     unreachable!();
/// };
/// assert_eq!(reply.content, "Hola");
/// assert_eq!(session.question_count_today()?, 1);
/// # Ok::<(), interpretalex::Error>(())
/// # }).unwrap();
/// ```
pub struct ConversationSession {
    transport: Arc<dyn AssistantTransport>,
    store: Arc<dyn KeyValueStore>,
    busy: AtomicBool,
    state: Mutex<SessionState>,
}

impl ConversationSession {
    /// Creates a session, restoring the last active thread from `store`.
    pub fn new(
        transport: Arc<dyn AssistantTransport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let thread_id = store.get(CURRENT_THREAD_KEY)?;
        Ok(Self {
            transport,
            store,
            busy: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                thread_id,
                ..SessionState::default()
            }),
        })
    }

    /// Creates a session and makes sure it has a thread, creating one if the store did
    /// not remember any.
    pub async fn open(
        transport: Arc<dyn AssistantTransport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let session = Self::new(transport, store)?;
        if session.thread_id().is_none() {
            session.new_thread().await?;
        }
        Ok(session)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The active thread, if any.
    pub fn thread_id(&self) -> Option<String> {
        self.state().thread_id.clone()
    }

    /// Creates a thread on the server, makes it active and clears the history.
    pub async fn new_thread(&self) -> Result<String> {
        let thread = self.transport.create_thread().await?;
        self.set_thread(&thread.id)?;
        Ok(thread.id)
    }

    /// Switches to an existing thread and clears the history.
    pub fn set_thread(&self, thread_id: &str) -> Result<()> {
        self.store.set(CURRENT_THREAD_KEY, thread_id)?;
        let mut state = self.state();
        state.thread_id = Some(thread_id.to_string());
        state.messages.clear();
        state.last_error = None;
        Ok(())
    }

    /// Returns true while a send is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Sends a user message and waits for the reply.
    ///
    /// Accepted sends bump today's question counter before the request goes out.  On a
    /// transport error the user message stays in the history, no assistant message is
    /// added, and the error text is kept in [`last_error`](Self::last_error).
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            SESSION_BUSY_REJECTIONS.click();
            return Ok(SendOutcome::Busy);
        };

        let thread_id = match self.thread_id() {
            Some(thread_id) => thread_id,
            None => self.new_thread().await?,
        };
        self.store.increment(&question_count_key(today()))?;
        SESSION_SENDS.click();

        {
            let mut state = self.state();
            state.last_error = None;
            state.messages.push(ChatMessage::user(fallback_id(), text));
        }

        match self.transport.send_chat(&thread_id, text).await {
            Ok(decoded) if decoded.is_empty() => {
                SESSION_EMPTY_REPLIES.click();
                Ok(SendOutcome::Empty)
            }
            Ok(decoded) => {
                let id = decoded
                    .message_id()
                    .map(str::to_string)
                    .unwrap_or_else(fallback_id);
                let reply = ChatMessage::assistant(id, decoded.text);
                self.state().messages.push(reply.clone());
                Ok(SendOutcome::Replied(reply))
            }
            Err(err) => {
                SESSION_SEND_ERRORS.click();
                self.state().last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// A snapshot of the history.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    /// Number of messages in the history.
    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }

    /// The most recent assistant reply.
    pub fn last_assistant_message(&self) -> Option<ChatMessage> {
        self.state()
            .messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .cloned()
    }

    /// Text of the last failed send, cleared by the next send.
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// How many questions were sent today.
    pub fn question_count_today(&self) -> Result<u64> {
        self.store.get_count(&question_count_key(today()))
    }

    /// Clears the history.  The thread stays active.
    pub fn clear(&self) {
        let mut state = self.state();
        state.messages.clear();
        state.last_error = None;
    }
}

/// Holds the busy flag for the duration of a send; dropping it releases the flag even if
/// the send future is cancelled.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Identifier for a message the server did not name: the current time in milliseconds.
fn fallback_id() -> String {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Semaphore;

    use crate::error::Error;
    use crate::store::MemoryStore;
    use crate::stream::{DecodedMessage, decode};
    use crate::types::{MessageRole, Thread};

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<DecodedMessage>>>,
        threads_created: AtomicUsize,
        sent: Mutex<Vec<(String, String)>>,
        gate: Option<Semaphore>,
    }

    impl ScriptedTransport {
        fn with_replies(replies: impl IntoIterator<Item = Result<DecodedMessage>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Self::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl AssistantTransport for ScriptedTransport {
        async fn create_thread(&self) -> Result<Thread> {
            let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Thread {
                id: format!("thread_{n}"),
                created_at: None,
                metadata: serde_json::Value::Null,
            })
        }

        async fn send_chat(&self, thread_id: &str, message: &str) -> Result<DecodedMessage> {
            self.sent
                .lock()
                .unwrap()
                .push((thread_id.to_string(), message.to_string()));
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(DecodedMessage::default()))
        }
    }

    #[tokio::test]
    async fn reply_is_appended() {
        let transport = Arc::new(ScriptedTransport::with_replies([Ok(decode(
            "5:{\"messageId\":\"m1\"}\n0:\"Hola \"\n0:\"mundo\"",
        ))]));
        let session = ConversationSession::open(transport.clone(), Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        assert_eq!(session.thread_id().as_deref(), Some("thread_1"));

        let outcome = session.send("  ¿Qué es una licitación?  ").await.unwrap();
        let SendOutcome::Replied(reply) = outcome else {
            panic!("expected a reply, got {outcome:?}");
        };
        assert_eq!(reply.id, "m1");
        assert_eq!(reply.content, "Hola mundo");

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "¿Qué es una licitación?");
        assert_eq!(session.last_assistant_message(), Some(reply));
        assert_eq!(
            *transport.sent.lock().unwrap(),
            vec![(
                "thread_1".to_string(),
                "¿Qué es una licitación?".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn missing_message_id_gets_a_fallback() {
        let transport = Arc::new(ScriptedTransport::with_replies([Ok(decode("5:oops\n0:\"x\""))]));
        let session = ConversationSession::open(transport, Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        let SendOutcome::Replied(reply) = session.send("hola").await.unwrap() else {
            panic!("expected a reply");
        };
        assert!(!reply.id.is_empty());
        assert!(reply.id.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn empty_reply_is_not_recorded() {
        let transport = Arc::new(ScriptedTransport::with_replies([Ok(decode(
            "5:{\"messageId\":\"m\"}\n",
        ))]));
        let store = Arc::new(MemoryStore::new());
        let session = ConversationSession::open(transport, store).await.unwrap();
        assert_eq!(session.send("hola").await.unwrap(), SendOutcome::Empty);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.last_assistant_message(), None);
        assert_eq!(session.question_count_today().unwrap(), 1);
    }

    #[tokio::test]
    async fn transport_error_keeps_user_message() {
        let transport = Arc::new(ScriptedTransport::with_replies([
            Ok(decode("0:\"primera\"")),
            Err(Error::service_unavailable("upstream down")),
        ]));
        let session = ConversationSession::open(transport, Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        session.send("uno").await.unwrap();
        let err = session.send("dos").await.unwrap_err();
        assert!(err.is_server_error());
        let contents: Vec<_> = session
            .messages()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        assert_eq!(
            contents,
            vec![
                (MessageRole::User, "uno".to_string()),
                (MessageRole::Assistant, "primera".to_string()),
                (MessageRole::User, "dos".to_string()),
            ]
        );
        assert!(session.last_error().unwrap().contains("upstream down"));
        assert_eq!(session.question_count_today().unwrap(), 2);
        assert!(!session.is_busy());

        session.send("tres").await.unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let transport = Arc::new(ScriptedTransport::default());
        let session = ConversationSession::open(transport.clone(), Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        assert_eq!(session.send("   ").await.unwrap(), SendOutcome::Ignored);
        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(session.question_count_today().unwrap(), 0);
    }

    #[tokio::test]
    async fn send_while_busy_is_a_no_op() {
        let transport = Arc::new(ScriptedTransport {
            gate: Some(Semaphore::new(0)),
            ..ScriptedTransport::with_replies([Ok(decode("0:\"ok\""))])
        });
        let session = Arc::new(
            ConversationSession::open(transport.clone(), Arc::new(MemoryStore::new()))
                .await
                .unwrap(),
        );

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.send("uno").await }
        });
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.send("dos").await.unwrap(), SendOutcome::Busy);
        assert_eq!(session.question_count_today().unwrap(), 1);

        transport.gate.as_ref().unwrap().add_permits(1);
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, SendOutcome::Replied(_)));
        assert!(!session.is_busy());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
        assert_eq!(session.message_count(), 2);
    }

    #[tokio::test]
    async fn thread_is_restored_from_store() {
        let store = Arc::new(MemoryStore::new());
        store.set(CURRENT_THREAD_KEY, "thread_saved").unwrap();
        let transport = Arc::new(ScriptedTransport::default());
        let session = ConversationSession::open(transport.clone(), store.clone())
            .await
            .unwrap();
        assert_eq!(session.thread_id().as_deref(), Some("thread_saved"));
        assert_eq!(transport.threads_created.load(Ordering::SeqCst), 0);

        let id = session.new_thread().await.unwrap();
        assert_eq!(id, "thread_1");
        assert_eq!(
            store.get(CURRENT_THREAD_KEY).unwrap().as_deref(),
            Some("thread_1")
        );
    }

    #[tokio::test]
    async fn switching_threads_clears_history() {
        let transport = Arc::new(ScriptedTransport::with_replies([Ok(decode("0:\"a\""))]));
        let session = ConversationSession::open(transport, Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        session.send("hola").await.unwrap();
        session.set_thread("thread_other").unwrap();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.thread_id().as_deref(), Some("thread_other"));
    }

    #[tokio::test]
    async fn send_without_thread_creates_one() {
        let transport = Arc::new(ScriptedTransport::with_replies([Ok(decode("0:\"a\""))]));
        let session =
            ConversationSession::new(transport.clone(), Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(session.thread_id(), None);
        session.send("hola").await.unwrap();
        assert_eq!(session.thread_id().as_deref(), Some("thread_1"));
    }
}
