//! gemchat-core: domain models, the chat state store and the contracts
//! implemented by the infrastructure and application crates.

pub mod chat;
pub mod clock;
pub mod config;
pub mod country;
pub mod error;
pub mod otp;
pub mod session;
pub mod state;
pub mod store;

// Re-export common types
pub use chat::{Chatroom, Message, MessageRole, NewMessage};
pub use error::ChatError;
pub use session::Session;
pub use state::{AppSnapshot, StateRepository};
pub use store::ChatStore;
