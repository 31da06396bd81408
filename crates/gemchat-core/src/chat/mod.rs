//! Chatrooms and the messages they hold.

pub mod chatroom;
pub mod message;

pub use chatroom::{Chatroom, INBOX_ID, INBOX_TITLE};
pub use message::{Message, MessageRole, NewMessage};
