//! UI-agnostic chat state types
//!
//! The transcript and its labeled view are shared by every front-end and
//! don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};
use std::slice;

/// A chat message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub message: String,
}

impl ChatMessage {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            message: message.into(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            message: message.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Display label shown next to a message
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }
}

/// Ordered list of exchanged messages. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: ChatRole, message: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            message: message.into(),
        });
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Lazily decorate each message with its display label.
    ///
    /// The returned iterator borrows the transcript and can be cloned to
    /// walk the view again from the start.
    pub fn labeled(&self) -> Labeled<'_> {
        Labeled {
            inner: self.messages.iter(),
        }
    }
}

/// A transcript message paired with its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabeledMessage<'a> {
    pub role: ChatRole,
    pub message: &'a str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct Labeled<'a> {
    inner: slice::Iter<'a, ChatMessage>,
}

impl<'a> Iterator for Labeled<'a> {
    type Item = LabeledMessage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|msg| LabeledMessage {
            role: msg.role,
            message: &msg.message,
            label: msg.role.label(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Labeled<'_> {}
