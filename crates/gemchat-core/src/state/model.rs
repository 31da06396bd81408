//! Persisted application state.

use serde::{Deserialize, Serialize};

use crate::chat::{Chatroom, INBOX_ID};
use crate::session::Session;

/// The whole application state, persisted as one unit.
///
/// # Fields
///
/// * `user` - Logged-in identity, `None` when logged out.
/// * `chatrooms` - Rooms, most recently created first.
/// * `selected_chat_id` - Room shown in the thread view.
/// * `dark` - Theme flag.
/// * `sidebar_visible` - Whether the room list is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    #[serde(default)]
    pub user: Option<Session>,

    #[serde(default)]
    pub chatrooms: Vec<Chatroom>,

    #[serde(default)]
    pub selected_chat_id: Option<String>,

    #[serde(default)]
    pub dark: bool,

    #[serde(default = "default_sidebar_visible")]
    pub sidebar_visible: bool,
}

fn default_sidebar_visible() -> bool {
    true
}

impl AppSnapshot {
    /// Fresh state: logged out, one "General" room selected, light theme,
    /// sidebar shown.
    pub fn seeded(now_millis: i64) -> Self {
        Self {
            user: None,
            chatrooms: vec![Chatroom::inbox(now_millis)],
            selected_chat_id: Some(INBOX_ID.to_string()),
            dark: false,
            sidebar_visible: true,
        }
    }

    pub fn chatroom(&self, id: &str) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|c| c.id == id)
    }

    pub fn chatroom_mut(&mut self, id: &str) -> Option<&mut Chatroom> {
        self.chatrooms.iter_mut().find(|c| c.id == id)
    }

    /// Whether `selected_chat_id` satisfies the selection invariant:
    /// it points at an existing room, or is `None` only when no rooms exist.
    pub fn selection_is_consistent(&self) -> bool {
        match &self.selected_chat_id {
            Some(id) => self.chatroom(id).is_some(),
            None => self.chatrooms.is_empty(),
        }
    }

    /// Repairs a selection that points at a missing room.
    ///
    /// Snapshots written by older builds may reference deleted rooms.
    pub fn normalize_selection(&mut self) -> bool {
        if self.selection_is_consistent() {
            return false;
        }
        self.selected_chat_id = self.chatrooms.first().map(|c| c.id.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded() {
        let state = AppSnapshot::seeded(7);
        assert!(state.user.is_none());
        assert_eq!(state.chatrooms.len(), 1);
        assert_eq!(state.chatrooms[0].id, "inbox");
        assert_eq!(state.chatrooms[0].title, "General");
        assert_eq!(state.selected_chat_id.as_deref(), Some("inbox"));
        assert!(!state.dark);
        assert!(state.sidebar_visible);
        assert!(state.selection_is_consistent());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let state: AppSnapshot = serde_json::from_str("{}").unwrap();
        assert!(state.chatrooms.is_empty());
        assert!(state.sidebar_visible);
        assert!(!state.dark);
    }

    #[test]
    fn test_normalize_selection() {
        let mut state = AppSnapshot::seeded(0);
        state.selected_chat_id = Some("gone".to_string());
        assert!(!state.selection_is_consistent());
        assert!(state.normalize_selection());
        assert_eq!(state.selected_chat_id.as_deref(), Some("inbox"));

        state.chatrooms.clear();
        assert!(state.normalize_selection());
        assert!(state.selected_chat_id.is_none());
        assert!(!state.normalize_selection());
    }
}
