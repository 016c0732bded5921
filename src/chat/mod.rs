//! Streaming chat: transcript, exchange status, and the reply transport.
//!
//! [`ChatState`] is the single owner of the transcript. A send is accepted
//! only when no exchange is outstanding; it appends the user message and an
//! empty assistant message together, and the assistant message then grows as
//! [`ReplyEvent`]s are applied.

mod protocol;
mod transport;

pub use protocol::{PlainTextDecoder, ReplyDecoder, ReplyEvent, SseDecoder};
pub use transport::{
    decode_reply, open_replies, ChatBackend, ChatRequest, HttpChatTransport, ReplyStream,
    TransportError,
};

use serde::{Deserialize, Serialize};

/// Shown in place of a failed reply.
pub const ERROR_NOTICE: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: vec![MessagePart::Text {
                text: String::new(),
            }],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                MessagePart::Text { text } => text.as_str(),
            })
            .collect()
    }

    fn append_text(&mut self, delta: &str) {
        match self.parts.last_mut() {
            Some(MessagePart::Text { text }) => text.push_str(delta),
            None => self.parts.push(MessagePart::Text {
                text: delta.to_string(),
            }),
        }
    }
}

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatStatus {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Ready,
    Error,
}

impl ChatStatus {
    /// An exchange is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, ChatStatus::Submitted | ChatStatus::Streaming)
    }
}

/// Transcript plus exchange status for one session.
#[derive(Debug)]
pub struct ChatState {
    session_id: String,
    messages: Vec<Message>,
    status: ChatStatus,
    error: Option<String>,
    next_id: u64,
    generation: u64,
}

impl ChatState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            status: ChatStatus::Idle,
            error: None,
            next_id: 1,
            generation: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    /// The current exchange's generation. Events tagged with any other
    /// generation belong to an abandoned exchange.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reason for the last failure, if the last exchange failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The synthetic assistant text to render after a failed exchange.
    pub fn error_notice(&self) -> Option<&'static str> {
        (self.status == ChatStatus::Error).then_some(ERROR_NOTICE)
    }

    pub fn accepts_send(&self) -> bool {
        !self.status.is_busy()
    }

    /// Start an exchange for `text`.
    ///
    /// Returns `None` without touching the transcript if an exchange is
    /// already outstanding.
    pub fn begin(&mut self, text: &str) -> Option<(u64, ChatRequest)> {
        if !self.accepts_send() {
            return None;
        }

        let user_id = self.allocate_id();
        self.messages.push(Message::user(user_id, text));
        let request = ChatRequest {
            id: self.session_id.clone(),
            text: text.to_string(),
            messages: self.messages.clone(),
        };

        let assistant_id = self.allocate_id();
        self.messages.push(Message::assistant(assistant_id));

        self.status = ChatStatus::Submitted;
        self.error = None;
        self.generation += 1;
        Some((self.generation, request))
    }

    /// Apply one reply event to the outstanding exchange.
    ///
    /// Returns whether anything changed. Events arriving when no exchange is
    /// outstanding are dropped.
    pub fn apply(&mut self, event: ReplyEvent) -> bool {
        if !self.status.is_busy() {
            return false;
        }
        match event {
            ReplyEvent::Started => {
                self.status = ChatStatus::Streaming;
            }
            ReplyEvent::Delta(delta) => {
                if let Some(last) = self
                    .messages
                    .last_mut()
                    .filter(|m| m.role == Role::Assistant)
                {
                    last.append_text(&delta);
                }
                self.status = ChatStatus::Streaming;
            }
            ReplyEvent::Finished => {
                self.status = ChatStatus::Ready;
            }
            ReplyEvent::Failed(reason) => {
                tracing::warn!(error = %reason, "Chat exchange failed");
                self.status = ChatStatus::Error;
                self.error = Some(reason);
            }
        }
        true
    }

    /// Discard the transcript and abandon any outstanding exchange.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.status = ChatStatus::Idle;
        self.error = None;
        self.generation += 1;
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("msg-{}", self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_begin_appends_two_messages() {
        let mut chat = ChatState::new("s");
        let (generation, request) = chat.begin("Hi").unwrap();

        assert_eq!(generation, 1);
        assert_eq!(chat.status(), ChatStatus::Submitted);
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, Role::User);
        assert_eq!(chat.messages()[0].text(), "Hi");
        assert_eq!(chat.messages()[1].role, Role::Assistant);
        assert_eq!(chat.messages()[1].text(), "");
        // The request carries the transcript through the user message only.
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.id, "s");
    }

    #[test]
    fn test_begin_rejected_while_busy() {
        let mut chat = ChatState::new("s");
        chat.begin("one").unwrap();
        assert!(chat.begin("two").is_none());

        chat.apply(ReplyEvent::Delta("x".into()));
        assert_eq!(chat.status(), ChatStatus::Streaming);
        assert!(chat.begin("three").is_none());
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn test_deltas_grow_assistant_message() {
        let mut chat = ChatState::new("s");
        chat.begin("Hi").unwrap();
        chat.apply(ReplyEvent::Started);
        chat.apply(ReplyEvent::Delta("Hel".into()));
        chat.apply(ReplyEvent::Delta("lo".into()));
        chat.apply(ReplyEvent::Finished);

        assert_eq!(chat.status(), ChatStatus::Ready);
        assert_eq!(chat.messages()[1].text(), "Hello");
        assert!(chat.accepts_send());
    }

    #[test]
    fn test_failure_keeps_partial_text_and_allows_retry() {
        let mut chat = ChatState::new("s");
        chat.begin("Hi").unwrap();
        chat.apply(ReplyEvent::Delta("par".into()));
        chat.apply(ReplyEvent::Failed("boom".into()));

        assert_eq!(chat.status(), ChatStatus::Error);
        assert_eq!(chat.error_notice(), Some(ERROR_NOTICE));
        assert_eq!(chat.messages()[1].text(), "par");
        assert!(chat.accepts_send());

        chat.begin("again").unwrap();
        assert_eq!(chat.error_notice(), None);
        assert_eq!(chat.messages().len(), 4);
    }

    #[test]
    fn test_events_after_completion_are_dropped() {
        let mut chat = ChatState::new("s");
        chat.begin("Hi").unwrap();
        chat.apply(ReplyEvent::Finished);
        assert!(!chat.apply(ReplyEvent::Delta("late".into())));
        assert_eq!(chat.messages()[1].text(), "");
    }

    #[test]
    fn test_reset_clears_and_ids_stay_monotonic() {
        let mut chat = ChatState::new("s");
        chat.begin("Hi").unwrap();
        let before = chat.generation();
        chat.reset();

        assert!(chat.messages().is_empty());
        assert_eq!(chat.status(), ChatStatus::Idle);
        assert!(chat.generation() > before);

        chat.begin("Again").unwrap();
        assert_eq!(chat.messages()[0].id, "msg-3");
    }
}
