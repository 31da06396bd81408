//! Chat use cases: validated mutations plus simulated replies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info};

use gemchat_core::chat::{Message, NewMessage};
use gemchat_core::error::{ChatError, Result};

use crate::reply::{ReplyHandle, ReplySimulator};
use crate::{SharedStore, lock_store};

const EVENT_CAPACITY: usize = 64;

/// Notifications for consumers rendering the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// An assistant message was appended to `chat_id`.
    ReplyArrived { chat_id: String, message: Message },
    /// A reply completed after its chatroom was removed and was discarded.
    ReplyDiscarded { chat_id: String },
}

type PendingReplies = Arc<Mutex<HashMap<String, HashMap<u64, ReplyHandle>>>>;

/// Coordinates the chat store with the reply simulator.
///
/// Cloning is cheap; clones share the store, the pending replies and the
/// event channel.
#[derive(Clone)]
pub struct ChatService {
    store: SharedStore,
    replies: ReplySimulator,
    pending: PendingReplies,
    next_reply_id: Arc<AtomicU64>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatService {
    pub fn new(store: SharedStore, replies: ReplySimulator) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            replies,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_reply_id: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Creates and selects a chatroom.
    pub fn create_chatroom(&self, title: &str) -> Result<String> {
        lock_store(&self.store)
            .create_chatroom(title)
            .ok_or_else(|| ChatError::validation("Chatroom title must not be empty"))
    }

    pub fn rename_chatroom(&self, id: &str, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(ChatError::validation("Chatroom title must not be empty"));
        }
        if lock_store(&self.store).rename_chatroom(id, title) {
            Ok(())
        } else {
            Err(ChatError::not_found("Chatroom", id))
        }
    }

    pub fn select_chat(&self, id: &str) -> Result<()> {
        if lock_store(&self.store).select_chat(id) {
            Ok(())
        } else {
            Err(ChatError::not_found("Chatroom", id))
        }
    }

    /// Cancels replies still pending for `id`, then deletes the chatroom.
    pub fn delete_chatroom(&self, id: &str) -> Result<()> {
        let cancelled = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(handles) = cancelled {
            for handle in handles.values() {
                handle.cancel();
            }
            debug!(chat_id = id, count = handles.len(), "Cancelled pending replies");
        }

        if lock_store(&self.store).delete_chatroom(id) {
            Ok(())
        } else {
            Err(ChatError::not_found("Chatroom", id))
        }
    }

    /// Appends the user's message and schedules the assistant reply.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send(&self, chat_id: &str, message: NewMessage) -> Result<Message> {
        if message.is_blank() {
            return Err(ChatError::validation("Nothing to send"));
        }

        let sent = lock_store(&self.store)
            .send_message(chat_id, message)
            .ok_or_else(|| ChatError::not_found("Chatroom", chat_id))?;

        self.schedule_reply(chat_id, &sent.text);
        Ok(sent)
    }

    /// Replies still in flight for `chat_id`.
    pub fn pending_replies(&self, chat_id: &str) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chat_id)
            .map_or(0, HashMap::len)
    }

    fn schedule_reply(&self, chat_id: &str, prompt: &str) {
        let reply_id = self.next_reply_id.fetch_add(1, Ordering::Relaxed);
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        let room = chat_id.to_string();

        // Held across scheduling so the callback cannot clear its entry
        // before it is inserted.
        let mut pending_guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let handle = self.replies.schedule_reply(prompt, move |reply| {
            let pushed = lock_store(&store).push_ai_message(&room, reply);

            {
                let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(room_pending) = pending.get_mut(&room) {
                    room_pending.remove(&reply_id);
                    if room_pending.is_empty() {
                        pending.remove(&room);
                    }
                }
            }

            let event = match pushed {
                Some(message) => ChatEvent::ReplyArrived {
                    chat_id: room,
                    message,
                },
                None => {
                    info!(chat_id = %room, "Reply arrived for a deleted chatroom, discarded");
                    ChatEvent::ReplyDiscarded { chat_id: room }
                }
            };
            // No subscribers is fine.
            let _ = events.send(event);
        });

        pending_guard
            .entry(chat_id.to_string())
            .or_default()
            .insert(reply_id, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::chat::{INBOX_ID, MessageRole};
    use gemchat_core::state::{AppSnapshot, StateRepository};
    use gemchat_core::store::ChatStore;
    use std::time::Duration;

    struct NullRepository;

    impl StateRepository for NullRepository {
        fn load(&self) -> Result<Option<AppSnapshot>> {
            Ok(None)
        }
        fn save(&self, _snapshot: &AppSnapshot) -> Result<()> {
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service() -> ChatService {
        let store = Arc::new(Mutex::new(ChatStore::load(Arc::new(NullRepository))));
        ChatService::new(store, ReplySimulator::default())
    }

    #[test]
    fn test_create_and_rename_validation() {
        let chat = service();

        assert!(chat.create_chatroom("   ").unwrap_err().is_validation());
        let id = chat.create_chatroom("Trip Planning").unwrap();

        assert!(chat.rename_chatroom(&id, " ").unwrap_err().is_validation());
        assert!(chat.rename_chatroom("missing", "X").unwrap_err().is_not_found());
        chat.rename_chatroom(&id, "Japan Trip").unwrap();

        let store = chat.store();
        let store = lock_store(&store);
        assert_eq!(store.chatroom(&id).unwrap().title, "Japan Trip");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_validation() {
        let chat = service();

        assert!(chat.send(INBOX_ID, NewMessage::text("  ")).unwrap_err().is_validation());
        assert!(chat.send("missing", NewMessage::text("hi")).unwrap_err().is_not_found());
        assert_eq!(chat.pending_replies(INBOX_ID), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_reply_arrives() {
        let chat = service();
        let mut events = chat.subscribe();

        let sent = chat.send(INBOX_ID, NewMessage::text("hello")).unwrap();
        assert_eq!(sent.role, MessageRole::User);
        assert_eq!(chat.pending_replies(INBOX_ID), 1);

        let event = events.recv().await.unwrap();
        let ChatEvent::ReplyArrived { chat_id, message } = event else {
            panic!("unexpected event: {:?}", event);
        };
        assert_eq!(chat_id, INBOX_ID);
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.text, "Gemini: hello (simulated reply)");
        assert_eq!(chat.pending_replies(INBOX_ID), 0);

        let store = chat.store();
        let store = lock_store(&store);
        let messages = &store.chatroom(INBOX_ID).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, sent.id);
        assert_eq!(messages[1].id, message.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_only_message_is_sent() {
        let chat = service();
        let sent = chat
            .send(INBOX_ID, NewMessage::default().with_image("data:image/png;base64,AAAA"))
            .unwrap();
        assert_eq!(sent.text, "");
        assert!(sent.image.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_cancels_pending_replies() {
        let chat = service();
        let mut events = chat.subscribe();
        let room = chat.create_chatroom("Scratch").unwrap();

        chat.send(&room, NewMessage::text("one")).unwrap();
        chat.send(&room, NewMessage::text("two")).unwrap();
        assert_eq!(chat.pending_replies(&room), 2);

        chat.delete_chatroom(&room).unwrap();
        assert_eq!(chat.pending_replies(&room), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert!(chat.delete_chatroom(&room).unwrap_err().is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_to_different_rooms_share_spacing() {
        let chat = service();
        let mut events = chat.subscribe();
        let room = chat.create_chatroom("Other").unwrap();

        chat.send(INBOX_ID, NewMessage::text("a")).unwrap();
        chat.send(&room, NewMessage::text("b")).unwrap();

        let first = events.recv().await.unwrap();
        let t1 = tokio::time::Instant::now();
        let second = events.recv().await.unwrap();
        let t2 = tokio::time::Instant::now();

        assert!(matches!(first, ChatEvent::ReplyArrived { ref chat_id, .. } if chat_id == INBOX_ID));
        assert!(matches!(second, ChatEvent::ReplyArrived { ref chat_id, .. } if chat_id == &room));
        assert!(t2.duration_since(t1) >= Duration::from_millis(1500));
    }
}
