//! Assistant conversation model
//!
//! A conversation always starts with the welcome line. Message ids are
//! millisecond timestamps, bumped when two messages land in the same
//! millisecond so they stay unique and increasing.

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str =
    "Hello! I'm Dr.NEO, your AI healthcare assistant. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    /// Kept as sent; the service writes its own format
    #[serde(default)]
    pub timestamp: String,
}

impl ChatMessage {
    pub fn welcome() -> Self {
        Self {
            id: 1,
            text: WELCOME_MESSAGE.to_string(),
            sender: Sender::Bot,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage::welcome()],
        }
    }
}

impl Conversation {
    /// An empty list becomes a fresh conversation
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            Self::default()
        } else {
            Self { messages }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> &ChatMessage {
        let now = Utc::now();
        let last_id = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
        let message = ChatMessage {
            id: now.timestamp_millis().max(last_id + 1),
            text: text.into(),
            sender,
            timestamp: now.to_rfc3339(),
        };
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_has_welcome() {
        let conversation = Conversation::default();
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].text, WELCOME_MESSAGE);
        assert_eq!(conversation.messages()[0].sender, Sender::Bot);
    }

    #[test]
    fn test_ids_increase() {
        let mut conversation = Conversation::default();
        let a = conversation.push(Sender::User, "hi").id;
        let b = conversation.push(Sender::Bot, "hello").id;
        let c = conversation.push(Sender::User, "again").id;
        assert!(1 < a && a < b && b < c);
    }

    #[test]
    fn test_wire_shape() {
        let json = r#"[{"id":1,"text":"Hello","sender":"bot","timestamp":"Mon Mar 03 10:00:00 IST 2025"},
                       {"id":1741000000000,"text":"I have a fever","sender":"user"}]"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[1].sender, Sender::User);
        assert!(conversation.messages()[1].timestamp.is_empty());

        let back = serde_json::to_value(&conversation).unwrap();
        assert!(back.is_array());
        assert_eq!(back[0]["sender"], "bot");
    }

    #[test]
    fn test_empty_list_starts_over() {
        let conversation = Conversation::from_messages(Vec::new());
        assert_eq!(conversation.last().unwrap().text, WELCOME_MESSAGE);
    }
}
