//! Chatroom domain model.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Id of the room present in a fresh state.
pub const INBOX_ID: &str = "inbox";
/// Title of the room present in a fresh state.
pub const INBOX_TITLE: &str = "General";

/// A named conversation holding an append-only list of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chatroom {
    pub id: String,
    pub title: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Chatroom {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at,
            messages: Vec::new(),
        }
    }

    /// The seeded "General" room.
    pub fn inbox(created_at: i64) -> Self {
        Self::new(INBOX_ID, INBOX_TITLE, created_at)
    }

    /// The newest `page * page_size` messages, oldest first, and whether
    /// older messages remain beyond them. Page 0 is treated as page 1.
    pub fn recent_messages(&self, page: usize, page_size: usize) -> (&[Message], bool) {
        let shown = page.max(1).saturating_mul(page_size);
        let start = self.messages.len().saturating_sub(shown);
        (&self.messages[start..], start > 0)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Timestamp of the newest message, or the room creation time when empty.
    pub fn last_activity(&self) -> i64 {
        self.last_message()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::MessageRole;

    #[test]
    fn test_inbox() {
        let room = Chatroom::inbox(42);
        assert_eq!(room.id, "inbox");
        assert_eq!(room.title, "General");
        assert!(room.messages.is_empty());
        assert_eq!(room.last_activity(), 42);
    }

    fn room_with_messages(count: usize) -> Chatroom {
        let mut room = Chatroom::new("r1", "Room", 0);
        for n in 0..count {
            room.messages.push(Message {
                id: format!("m{}", n),
                role: MessageRole::User,
                text: n.to_string(),
                created_at: n as i64,
                image: None,
            });
        }
        room
    }

    #[test]
    fn test_recent_messages_pages_from_the_end() {
        let room = room_with_messages(25);

        let (page_one, older) = room.recent_messages(1, 20);
        assert_eq!(page_one.len(), 20);
        assert_eq!(page_one[0].id, "m5");
        assert_eq!(page_one[19].id, "m24");
        assert!(older);

        let (page_two, older) = room.recent_messages(2, 20);
        assert_eq!(page_two.len(), 25);
        assert_eq!(page_two[0].id, "m0");
        assert!(!older);

        assert_eq!(room.recent_messages(0, 20).0.len(), 20);
        assert_eq!(room.recent_messages(usize::MAX, 20).0.len(), 25);
    }

    #[test]
    fn test_recent_messages_empty_room() {
        let room = room_with_messages(0);
        let (messages, older) = room.recent_messages(1, 20);
        assert!(messages.is_empty());
        assert!(!older);
    }

    #[test]
    fn test_last_activity_follows_messages() {
        let mut room = Chatroom::new("r1", "Room", 10);
        room.messages.push(Message {
            id: "m1".to_string(),
            role: MessageRole::User,
            text: "hey".to_string(),
            created_at: 25,
            image: None,
        });
        assert_eq!(room.last_activity(), 25);
    }
}
