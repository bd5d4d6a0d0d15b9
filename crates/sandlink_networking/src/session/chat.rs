//! Bounded chat history.
//!
//! Message ids are unique: a re-sent id replaces the stored message where it
//! stands. When the cap is reached the oldest message is evicted.

use std::collections::VecDeque;

use sandlink_shared::{ChatMessage, ChatMessageType};

/// What [`ChatHistory::push`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatInsert {
    /// New message appended, possibly evicting the oldest.
    Appended {
        /// Message pushed out by the cap.
        evicted: Option<ChatMessage>,
    },
    /// An existing id was overwritten.
    Replaced(ChatMessage),
}

/// Ordered chat history of one session.
#[derive(Clone, Debug)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ChatHistory {
    /// Creates an empty history holding at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Number of stored messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Looks up a message by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Appends or replaces by id.
    pub fn push(&mut self, message: ChatMessage) -> ChatInsert {
        if let Some(slot) = self.messages.iter_mut().find(|m| m.id == message.id) {
            return ChatInsert::Replaced(std::mem::replace(slot, message));
        }
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        ChatInsert::Appended { evicted }
    }

    /// Removes by id.
    pub fn delete(&mut self, id: &str) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        self.messages.remove(index)
    }

    /// Replaces the whole history, keeping the newest `capacity` messages.
    pub fn reset(&mut self, messages: Vec<ChatMessage>) {
        self.messages.clear();
        for message in messages {
            self.push(message);
        }
    }

    /// Newest message created strictly before `created_at`. On a tie the
    /// one stored first wins.
    #[must_use]
    pub fn latest_before(&self, created_at: f64) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.created_at < created_at)
            .fold(None, |best: Option<&ChatMessage>, m| match best {
                Some(b) if b.created_at >= m.created_at => Some(b),
                _ => Some(m),
            })
    }

    /// Message that precedes `id` in creation time, wherever it is stored.
    #[must_use]
    pub fn previous(&self, id: &str) -> Option<&ChatMessage> {
        self.latest_before(self.get(id)?.created_at)
    }

    /// Returns true if `id` follows a regular message by the same author,
    /// so a chat view can fold it under the previous header.
    #[must_use]
    pub fn continues_previous(&self, id: &str) -> bool {
        match (self.get(id), self.previous(id)) {
            (Some(current), Some(previous)) => {
                previous.author == current.author
                    && previous.message_type == ChatMessageType::Message
            }
            _ => false,
        }
    }

    /// Snapshot of the history, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, author: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            created_at: id.parse().unwrap_or_default(),
            author: author.into(),
            content: content.into(),
            ..ChatMessage::default()
        }
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut chat = ChatHistory::new(10);
        chat.push(message("1", "a", "x"));
        chat.push(message("2", "a", "y"));
        chat.push(message("3", "b", "z"));
        assert_eq!(chat.delete("2").unwrap().content, "y");
        let ids: Vec<_> = chat.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert!(chat.delete("2").is_none());
    }

    #[test]
    fn test_resent_id_replaces_in_place() {
        let mut chat = ChatHistory::new(10);
        chat.push(message("1", "a", "first"));
        chat.push(message("2", "a", "second"));
        let insert = chat.push(message("1", "a", "edited"));
        assert!(matches!(insert, ChatInsert::Replaced(old) if old.content == "first"));
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.iter().next().unwrap().content, "edited");
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut chat = ChatHistory::new(2);
        chat.push(message("1", "a", ""));
        chat.push(message("2", "a", ""));
        let insert = chat.push(message("3", "a", ""));
        assert!(matches!(insert, ChatInsert::Appended { evicted: Some(m) } if m.id == "1"));
        assert!(chat.get("1").is_none());
        assert_eq!(chat.len(), 2);
    }

    #[test]
    fn test_reset_keeps_newest() {
        let mut chat = ChatHistory::new(2);
        chat.reset(vec![message("1", "a", ""), message("2", "a", ""), message("3", "a", "")]);
        let ids: Vec<_> = chat.to_vec().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["2", "3"]);
    }

    #[test]
    fn test_continuation_grouping() {
        let mut chat = ChatHistory::new(10);
        chat.push(message("1", "a", "hi"));
        chat.push(message("2", "a", "again"));
        chat.push(message("3", "b", "yo"));
        let mut notice = message("4", "b", "joined");
        notice.message_type = ChatMessageType::Join;
        chat.push(notice);
        chat.push(message("5", "b", "after notice"));

        assert!(!chat.continues_previous("1"));
        assert!(chat.continues_previous("2"));
        assert!(!chat.continues_previous("3"));
        assert!(!chat.continues_previous("5"));
        assert_eq!(chat.previous("3").unwrap().id, "2");
    }

    #[test]
    fn test_previous_follows_creation_time() {
        let mut chat = ChatHistory::new(10);
        // history arrives out of order
        chat.reset(vec![
            message("30", "b", "third"),
            message("10", "a", "first"),
            message("20", "a", "second"),
        ]);
        assert_eq!(chat.previous("20").unwrap().id, "10");
        assert_eq!(chat.previous("30").unwrap().id, "20");
        assert!(chat.previous("10").is_none());
        assert!(chat.continues_previous("20"));

        // an edit keeps its slot but carries a new timestamp
        let mut edited = message("10", "a", "first, edited");
        edited.created_at = 25.0;
        chat.push(edited);
        assert_eq!(chat.previous("30").unwrap().id, "10");
        assert!(chat.previous("20").is_none());
    }

    #[test]
    fn test_latest_before_tie_keeps_first_stored() {
        let mut chat = ChatHistory::new(10);
        let mut early = message("a", "x", "");
        early.created_at = 5.0;
        let mut twin = message("b", "y", "");
        twin.created_at = 5.0;
        chat.push(early);
        chat.push(twin);
        assert_eq!(chat.latest_before(6.0).unwrap().id, "a");
        assert!(chat.latest_before(5.0).is_none());
    }
}
