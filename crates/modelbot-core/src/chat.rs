//! Chat session: the transcript, the input buffer, and the single
//! in-flight completion request.
//!
//! A send cycle always moves `Idle -> Sending -> Idle`. Failures don't get a
//! state of their own; they land in the transcript as a fixed assistant
//! message and the session is idle again.

use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::ai::Completion;
use crate::error::RemoteError;
use crate::state::{ChatRole, Labeled, Transcript};

/// Shown when the collaborator answers with an empty string.
pub const NO_RESPONSE: &str = "No response received.";

/// Shown when the collaborator call fails for any reason.
pub const ERROR_RESPONSE: &str = "An error occurred while processing your message.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// Published on every mutation so a front-end knows when to re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revision {
    pub seq: u64,
    pub pending: bool,
    pub transcript_len: usize,
}

#[derive(Debug)]
pub struct ChatSession {
    input: String,
    transcript: Transcript,
    pending: bool,
    changes: watch::Sender<Revision>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Revision::default());
        Self {
            input: String::new(),
            transcript: Transcript::new(),
            pending: false,
            changes,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.notify();
    }

    /// Edit the input buffer in place (cursor-based editing in the TUI).
    pub fn edit_input<F: FnOnce(&mut String)>(&mut self, edit: F) {
        edit(&mut self.input);
        self.notify();
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Transcript decorated with display labels
    pub fn labeled(&self) -> Labeled<'_> {
        self.transcript.labeled()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn state(&self) -> SessionState {
        if self.pending {
            SessionState::Sending
        } else {
            SessionState::Idle
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.changes.subscribe()
    }

    /// Drop every message. An in-flight request still settles afterwards.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.notify();
    }

    /// First half of a send cycle.
    ///
    /// Returns the message to hand to the collaborator, or `None` when the
    /// input is blank or a request is already in flight. In both of those
    /// cases nothing changes.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.pending {
            debug!("send ignored, request already in flight");
            return None;
        }
        if self.input.trim().is_empty() {
            return None;
        }

        let message = self.input.clone();
        self.transcript.append(ChatRole::User, message.as_str());
        self.pending = true;
        self.notify();
        Some(message)
    }

    /// Second half of a send cycle: record the outcome and go back to idle.
    pub fn settle(&mut self, result: Result<String, RemoteError>) {
        if !self.pending {
            warn!("completion settled with no request in flight, dropping it");
            return;
        }

        let reply = match result {
            Ok(text) if text.is_empty() => NO_RESPONSE.to_string(),
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "error fetching chat response");
                ERROR_RESPONSE.to_string()
            }
        };
        self.transcript.append(ChatRole::Assistant, reply);

        self.pending = false;
        self.input.clear();
        self.notify();
    }

    /// Run a full send cycle against `client`.
    pub async fn send<C>(&mut self, client: &C)
    where
        C: Completion + ?Sized,
    {
        let Some(message) = self.begin_send() else {
            return;
        };
        let result = client.complete(&message).await;
        self.settle(result);
    }

    fn notify(&self) {
        let pending = self.pending;
        let transcript_len = self.transcript.len();
        self.changes.send_modify(|rev| {
            rev.seq += 1;
            rev.pending = pending;
            rev.transcript_len = transcript_len;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Replies from a script and remembers what it was asked.
    struct Scripted {
        replies: Mutex<Vec<Result<String, RemoteError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<String, RemoteError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        fn failing() -> Self {
            Self::new(vec![Err(RemoteError::Task("boom".to_string()))])
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Completion for Scripted {
        async fn complete(&self, message: &str) -> Result<String, RemoteError> {
            self.seen.lock().unwrap().push(message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    /// Blocks inside `complete` until released.
    struct Gated {
        called: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Completion for Gated {
        async fn complete(&self, _message: &str) -> Result<String, RemoteError> {
            self.called.notify_one();
            self.release.notified().await;
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_whitespace_input_is_noop() {
        let client = Scripted::replying("unused");
        let mut session = ChatSession::new();
        session.set_input(" ");

        session.send(&client).await;

        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
        assert_eq!(session.input(), " ");
        assert!(client.seen().is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_tab_input_is_noop() {
        let client = Scripted::replying("unused");
        let mut session = ChatSession::new();
        for input in ["", "\t\n", "   "] {
            session.set_input(input);
            assert_eq!(session.begin_send(), None);
        }
        session.send(&client).await;
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_successful_reply() {
        let client = Scripted::replying("Hello");
        let mut session = ChatSession::new();
        session.set_input("Hi");

        session.send(&client).await;

        assert_eq!(
            session.transcript().messages(),
            &[ChatMessage::user("Hi"), ChatMessage::assistant("Hello")]
        );
        assert!(!session.is_pending());
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback() {
        let client = Scripted::replying("");
        let mut session = ChatSession::new();
        session.set_input("Hi");

        session.send(&client).await;

        assert_eq!(
            session.transcript().messages(),
            &[ChatMessage::user("Hi"), ChatMessage::assistant(NO_RESPONSE)]
        );
    }

    #[tokio::test]
    async fn test_failure_becomes_transcript_entry() {
        let client = Scripted::failing();
        let mut session = ChatSession::new();
        session.set_input("Hi");

        session.send(&client).await;

        assert_eq!(
            session.transcript().messages(),
            &[ChatMessage::user("Hi"), ChatMessage::assistant(ERROR_RESPONSE)]
        );
        assert!(!session.is_pending());
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn test_untrimmed_input_is_recorded_and_sent() {
        let client = Scripted::replying("ok");
        let mut session = ChatSession::new();
        session.set_input("  padded  ");

        session.send(&client).await;

        assert_eq!(session.transcript().messages()[0].message, "  padded  ");
        assert_eq!(client.seen(), vec!["  padded  ".to_string()]);
    }

    #[tokio::test]
    async fn test_each_cycle_adds_two_entries() {
        let client = Scripted::new(vec![
            Ok("one".to_string()),
            Err(RemoteError::MissingKey("Claude")),
            Ok(String::new()),
        ]);
        let mut session = ChatSession::new();

        for (i, input) in ["a", "b", "c"].iter().enumerate() {
            session.set_input(*input);
            session.send(&client).await;
            assert_eq!(session.transcript().len(), (i + 1) * 2);
            assert_eq!(session.input(), "");
        }

        let roles: Vec<ChatRole> = session
            .transcript()
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_after_sends() {
        let client = Scripted::new(vec![Ok("x".to_string()), Ok("y".to_string())]);
        let mut session = ChatSession::new();
        for input in ["first", "second"] {
            session.set_input(input);
            session.send(&client).await;
        }

        session.clear();

        assert!(session.transcript().is_empty());
        assert_eq!(session.labeled().count(), 0);
    }

    #[tokio::test]
    async fn test_pending_only_while_request_in_flight() {
        let client = Gated {
            called: Notify::new(),
            release: Notify::new(),
        };
        let mut session = ChatSession::new();
        let rx = session.subscribe();
        session.set_input("Hi");
        assert!(!rx.borrow().pending);

        let observe = async {
            client.called.notified().await;
            let during = *rx.borrow();
            client.release.notify_one();
            during
        };
        let ((), during) = tokio::join!(session.send(&client), observe);

        assert!(during.pending);
        assert_eq!(during.transcript_len, 1);
        assert!(!session.is_pending());
        assert!(!rx.borrow().pending);
        assert_eq!(rx.borrow().transcript_len, 2);
    }

    #[test]
    fn test_second_send_ignored_while_pending() {
        let mut session = ChatSession::new();
        session.set_input("first");
        assert_eq!(session.begin_send(), Some("first".to_string()));
        assert_eq!(session.state(), SessionState::Sending);

        session.set_input("second");
        assert_eq!(session.begin_send(), None);
        assert_eq!(session.transcript().len(), 1);

        session.settle(Ok("reply".to_string()));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            session.transcript().messages(),
            &[ChatMessage::user("first"), ChatMessage::assistant("reply")]
        );
    }

    #[test]
    fn test_failure_is_logged_at_error_level() {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, guard) = crate::logging::file_subscriber(dir.path()).unwrap();
        let mut session = ChatSession::new();
        session.set_input("Hi");
        session.begin_send();

        tracing::subscriber::with_default(subscriber, || {
            session.settle(Err(RemoteError::Task("connection reset".to_string())));
        });
        drop(guard);

        let logs = crate::logging::read_logs(dir.path());
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("error fetching chat response"));
        assert!(logs.contains("completion task failed: connection reset"));
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::assistant(ERROR_RESPONSE))
        );
    }

    #[test]
    fn test_settle_without_request_is_ignored() {
        let mut session = ChatSession::new();
        session.set_input("draft");
        session.settle(Ok("stray".to_string()));
        assert!(session.transcript().is_empty());
        assert_eq!(session.input(), "draft");
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut session = ChatSession::new();
        let rx = session.subscribe();
        let start = rx.borrow().seq;

        session.set_input("Hi");
        session.begin_send();
        session.settle(Ok("Hello".to_string()));
        session.clear();

        assert_eq!(rx.borrow().seq, start + 4);
        assert_eq!(rx.borrow().transcript_len, 0);
    }

    #[test]
    fn test_labeled_view_matches_transcript() {
        let mut session = ChatSession::new();
        session.set_input("Hi");
        session.begin_send();
        session.settle(Ok("Hello".to_string()));

        let view: Vec<_> = session.labeled().collect();
        assert_eq!(view.len(), session.transcript().len());
        assert_eq!(view[0].label, "You");
        assert_eq!(view[0].message, "Hi");
        assert_eq!(view[1].label, "Assistant");
    }
}
