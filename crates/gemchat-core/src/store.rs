//! The application state store.
//!
//! `ChatStore` is the single source of truth for the session, the chatrooms
//! and the UI flags. Its methods are the only way to change that state; each
//! one that changes something writes the full snapshot back through the
//! injected [`StateRepository`].

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::{Chatroom, Message, MessageRole, NewMessage};
use crate::clock::{Clock, SystemClock};
use crate::session::Session;
use crate::state::{AppSnapshot, StateRepository};

/// Persisted state container for session, chatrooms and UI flags.
///
/// Construct one at application start and hand it to consumers; there is no
/// global instance. None of the operations fail: unknown ids and empty titles
/// turn the call into a no-op, and persistence failures are logged.
pub struct ChatStore {
    state: AppSnapshot,
    repository: Arc<dyn StateRepository>,
    clock: Arc<dyn Clock>,
}

impl ChatStore {
    /// Rehydrates the store from `repository`, using the system clock.
    pub fn load(repository: Arc<dyn StateRepository>) -> Self {
        Self::load_with_clock(repository, Arc::new(SystemClock))
    }

    /// Rehydrates the store from `repository`.
    ///
    /// A missing or unreadable snapshot yields the seeded default state.
    pub fn load_with_clock(repository: Arc<dyn StateRepository>, clock: Arc<dyn Clock>) -> Self {
        let state = match repository.load() {
            Ok(Some(mut snapshot)) => {
                if snapshot.normalize_selection() {
                    debug!(
                        selected = ?snapshot.selected_chat_id,
                        "Stored selection pointed at a missing chatroom, reselected"
                    );
                }
                info!(
                    chatrooms = snapshot.chatrooms.len(),
                    logged_in = snapshot.user.is_some(),
                    "Rehydrated chat state"
                );
                snapshot
            }
            Ok(None) => {
                info!("No stored chat state, starting from defaults");
                AppSnapshot::seeded(clock.now_millis())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load chat state, starting from defaults");
                AppSnapshot::seeded(clock.now_millis())
            }
        };

        Self {
            state,
            repository,
            clock,
        }
    }

    // ============================================================================
    // Read accessors
    // ============================================================================

    /// The full current state.
    pub fn snapshot(&self) -> &AppSnapshot {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.user.is_some()
    }

    /// Rooms, most recently created first.
    pub fn chatrooms(&self) -> &[Chatroom] {
        &self.state.chatrooms
    }

    pub fn chatroom(&self, id: &str) -> Option<&Chatroom> {
        self.state.chatroom(id)
    }

    /// Rooms whose title contains `query`, ignoring case, paired with their
    /// position in [`chatrooms`](Self::chatrooms). A blank query matches every
    /// room.
    pub fn search_chatrooms(&self, query: &str) -> Vec<(usize, &Chatroom)> {
        let needle = query.trim().to_lowercase();
        self.state
            .chatrooms
            .iter()
            .enumerate()
            .filter(|(_, room)| {
                needle.is_empty() || room.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn selected_chat_id(&self) -> Option<&str> {
        self.state.selected_chat_id.as_deref()
    }

    pub fn selected_chatroom(&self) -> Option<&Chatroom> {
        self.selected_chat_id().and_then(|id| self.state.chatroom(id))
    }

    pub fn is_dark(&self) -> bool {
        self.state.dark
    }

    pub fn is_sidebar_visible(&self) -> bool {
        self.state.sidebar_visible
    }

    // ============================================================================
    // Session
    // ============================================================================

    /// Sets the session. The identity is stored as given.
    pub fn login(&mut self, session: Session) {
        info!(country_code = %session.country_code, "Session started");
        self.state.user = Some(session);
        self.persist();
    }

    /// Clears the session. Chatrooms and messages are kept.
    pub fn logout(&mut self) {
        info!("Session ended");
        self.state.user = None;
        self.persist();
    }

    // ============================================================================
    // UI flags
    // ============================================================================

    pub fn set_dark(&mut self, dark: bool) {
        self.state.dark = dark;
        self.persist();
    }

    pub fn toggle_sidebar(&mut self) {
        self.state.sidebar_visible = !self.state.sidebar_visible;
        self.persist();
    }

    /// Selects a chatroom.
    ///
    /// Unknown ids are ignored so the selection always points at an existing
    /// room. Returns whether the selection was applied.
    pub fn select_chat(&mut self, id: &str) -> bool {
        if self.state.chatroom(id).is_none() {
            debug!(chat_id = id, "Ignoring selection of unknown chatroom");
            return false;
        }
        self.state.selected_chat_id = Some(id.to_string());
        self.persist();
        true
    }

    // ============================================================================
    // Chatrooms
    // ============================================================================

    /// Creates a room in front of the list and selects it.
    ///
    /// The title is trimmed; an empty title leaves the state untouched and
    /// returns `None`. Otherwise returns the new room id.
    pub fn create_chatroom(&mut self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring chatroom creation with empty title");
            return None;
        }

        let id = Uuid::new_v4().to_string();
        let room = Chatroom::new(id.clone(), title, self.clock.now_millis());
        self.state.chatrooms.insert(0, room);
        self.state.selected_chat_id = Some(id.clone());
        debug!(chat_id = %id, "Chatroom created");
        self.persist();
        Some(id)
    }

    /// Renames a room. Empty titles and unknown ids are ignored.
    pub fn rename_chatroom(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            debug!(chat_id = id, "Ignoring rename with empty title");
            return false;
        }
        let Some(room) = self.state.chatroom_mut(id) else {
            debug!(chat_id = id, "Ignoring rename of unknown chatroom");
            return false;
        };
        room.title = title.to_string();
        self.persist();
        true
    }

    /// Deletes a room and its messages.
    ///
    /// When the deleted room was selected, the first remaining room becomes
    /// selected, or nothing when the list is now empty. Returns whether a room
    /// was removed.
    pub fn delete_chatroom(&mut self, id: &str) -> bool {
        let before = self.state.chatrooms.len();
        self.state.chatrooms.retain(|c| c.id != id);
        if self.state.chatrooms.len() == before {
            debug!(chat_id = id, "Ignoring deletion of unknown chatroom");
            return false;
        }

        if self.state.selected_chat_id.as_deref() == Some(id) {
            self.state.selected_chat_id = self.state.chatrooms.first().map(|c| c.id.clone());
        }
        debug!(chat_id = id, "Chatroom deleted");
        self.persist();
        true
    }

    // ============================================================================
    // Messages
    // ============================================================================

    /// Appends a user message to `chat_id` and returns it.
    ///
    /// Returns `None` without touching the state when the room does not exist.
    pub fn send_message(&mut self, chat_id: &str, message: NewMessage) -> Option<Message> {
        self.append(chat_id, MessageRole::User, message.text, message.image)
    }

    /// Appends an assistant message to `chat_id`.
    ///
    /// A reply that arrives after its room was deleted is dropped here.
    pub fn push_ai_message(&mut self, chat_id: &str, text: impl Into<String>) -> Option<Message> {
        self.append(chat_id, MessageRole::Assistant, text.into(), None)
    }

    fn append(
        &mut self,
        chat_id: &str,
        role: MessageRole,
        text: String,
        image: Option<String>,
    ) -> Option<Message> {
        let now = self.clock.now_millis();
        let Some(room) = self.state.chatroom_mut(chat_id) else {
            debug!(chat_id, role = role.as_str(), "Dropping message for unknown chatroom");
            return None;
        };

        // Keep timestamps non-decreasing even if the wall clock steps back.
        let created_at = room
            .last_message()
            .map_or(now, |last| now.max(last.created_at));
        let message = Message {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            created_at,
            image,
        };
        room.messages.push(message.clone());
        self.persist();
        Some(message)
    }

    fn persist(&self) {
        if let Err(e) = self.repository.save(&self.state) {
            warn!(error = %e, "Failed to persist chat state");
        }
    }
}
