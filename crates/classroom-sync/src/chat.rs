//! Room chat log.
//!
//! Messages are kept in arrival order in a bounded ring buffer so memory
//! usage stays predictable. Every received message is appended, including
//! the relay's echo of our own sends; there are no ids and no dedup.

use std::collections::VecDeque;

use classroom_common::ClientEvent;
use classroom_config::ChatConfig;

/// A single chat message as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub author_name: String,
    pub text: String,
    /// Local arrival counter. Keeps increasing after old messages are evicted.
    pub arrival_order: u64,
}

/// In-memory chat history for one room session.
#[derive(Debug)]
pub struct ChatLog {
    max_messages: usize,
    messages: VecDeque<ChatMessage>,
    next_order: u64,
}

impl ChatLog {
    pub fn new(config: &ChatConfig) -> Self {
        Self::with_capacity(config.max_messages as usize)
    }

    pub fn with_capacity(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            messages: VecDeque::new(),
            next_order: 0,
        }
    }

    /// Build the outgoing `chatMessage` for `text`. Whitespace is trimmed and
    /// empty messages are not sent. The log itself is only updated when the
    /// relay echoes the message back.
    pub fn compose(text: &str, username: &str) -> Option<ClientEvent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(ClientEvent::ChatMessage {
            message: text.to_string(),
            username: username.to_string(),
        })
    }

    /// Append a received message. Oldest messages are evicted when the
    /// buffer is full.
    pub fn on_message(
        &mut self,
        author_name: impl Into<String>,
        text: impl Into<String>,
    ) -> &ChatMessage {
        if self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(ChatMessage {
            author_name: author_name.into(),
            text: text.into(),
            arrival_order: self.next_order,
        });
        self.next_order += 1;
        &self.messages[self.messages.len() - 1]
    }

    /// The most recent `limit` messages (oldest first).
    pub fn recent(&self, limit: usize) -> Vec<&ChatMessage> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).collect()
    }

    pub fn all(&self) -> Vec<&ChatMessage> {
        self.messages.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages. Arrival order keeps counting.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(&ChatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_trims_and_skips_empty() {
        assert_eq!(
            ChatLog::compose("  hi there \n", "ada"),
            Some(ClientEvent::ChatMessage {
                message: "hi there".into(),
                username: "ada".into(),
            })
        );
        assert_eq!(ChatLog::compose("   ", "ada"), None);
    }

    #[test]
    fn appends_in_arrival_order() {
        let mut log = ChatLog::default();
        log.on_message("ada", "one");
        log.on_message("bob", "two");
        log.on_message("ada", "one");

        let all = log.all();
        assert_eq!(all.len(), 3);
        assert_eq!(
            all.iter().map(|m| m.arrival_order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(all[2].text, "one");
    }

    #[test]
    fn bounded_buffer_evicts_oldest() {
        let mut log = ChatLog::with_capacity(2);
        log.on_message("a", "1");
        log.on_message("a", "2");
        log.on_message("a", "3");

        let texts: Vec<_> = log.all().iter().map(|m| m.text.clone()).collect();
        assert_eq!(texts, vec!["2", "3"]);
        assert_eq!(log.all()[1].arrival_order, 2);
    }

    #[test]
    fn recent_returns_newest_oldest_first() {
        let mut log = ChatLog::default();
        for i in 0..5 {
            log.on_message("a", i.to_string());
        }
        let texts: Vec<_> = log.recent(2).iter().map(|m| m.text.clone()).collect();
        assert_eq!(texts, vec!["3", "4"]);
        assert_eq!(log.recent(50).len(), 5);
    }

    #[test]
    fn clear_keeps_counting() {
        let mut log = ChatLog::default();
        log.on_message("a", "x");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.on_message("a", "y").arrival_order, 1);
    }
}
