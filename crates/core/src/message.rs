//! Message and Transcript domain types.
//!
//! These are the value objects that flow through a chat session:
//! the engineer asks a question → it is recorded as a user message →
//! the model's answer is recorded as an assistant message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The plant engineer
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The ordered, append-only log of one chat session.
///
/// Insertion order is display order. Every assistant message directly
/// follows the user message it answers; a user message may stay
/// unanswered when its turn failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user question. Blank or whitespace-only text is rejected.
    pub fn append_user(&mut self, text: impl Into<String>) -> Result<&Message> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        self.messages.push(Message::user(text));
        Ok(self.last_pushed())
    }

    /// Append the assistant's answer to the latest user question.
    pub fn append_assistant(&mut self, text: impl Into<String>) -> Result<&Message> {
        if !self.awaiting_reply() {
            return Err(Error::UnpairedReply);
        }
        self.messages.push(Message::assistant(text));
        Ok(self.last_pushed())
    }

    /// Whether the last message is a user question with no answer yet.
    pub fn awaiting_reply(&self) -> bool {
        self.messages.last().is_some_and(|m| m.role == Role::User)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user questions that never received an answer.
    pub fn unanswered(&self) -> usize {
        self.messages
            .iter()
            .enumerate()
            .filter(|(i, m)| {
                m.role == Role::User
                    && self
                        .messages
                        .get(i + 1)
                        .is_none_or(|next| next.role == Role::User)
            })
            .count()
    }

    fn last_pushed(&self) -> &Message {
        // Only called right after a push.
        &self.messages[self.messages.len() - 1]
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Lista los equipos");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Lista los equipos");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn transcript_rejects_blank_questions() {
        let mut t = Transcript::new();
        assert!(matches!(t.append_user("   \n\t"), Err(Error::EmptyInput)));
        assert!(matches!(t.append_user(""), Err(Error::EmptyInput)));
        assert!(t.is_empty());
    }

    #[test]
    fn transcript_keeps_insertion_order() {
        let mut t = Transcript::new();
        t.append_user("q1").unwrap();
        t.append_assistant("a1").unwrap();
        t.append_user("q2").unwrap();

        let contents: Vec<_> = t.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q1", "a1", "q2"]);
        assert!(t.awaiting_reply());
    }

    #[test]
    fn assistant_reply_requires_pending_question() {
        let mut t = Transcript::new();
        assert!(matches!(t.append_assistant("hi"), Err(Error::UnpairedReply)));

        t.append_user("q").unwrap();
        t.append_assistant("a").unwrap();
        assert!(matches!(t.append_assistant("again"), Err(Error::UnpairedReply)));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn unanswered_counts_orphan_questions() {
        let mut t = Transcript::new();
        t.append_user("q1").unwrap();
        t.append_user("q2").unwrap();
        t.append_assistant("a2").unwrap();
        t.append_user("q3").unwrap();
        assert_eq!(t.unanswered(), 2);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }
}
