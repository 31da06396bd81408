//! Application layer for gemchat.
//!
//! Use cases that coordinate the chat store with the OTP issuer, the
//! country provider and the reply simulator.

pub mod auth;
pub mod chat_service;
pub mod countdown;
pub mod countries;
pub mod otp;
pub mod reply;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gemchat_core::store::ChatStore;

pub use auth::AuthService;
pub use chat_service::{ChatEvent, ChatService};
pub use countdown::{CountdownHandle, OtpCountdown};
pub use countries::CountryCatalog;
pub use otp::LocalOtpService;
pub use reply::{ReplyHandle, ReplySimulator};

/// Store handle shared between services and the UI.
pub type SharedStore = Arc<Mutex<ChatStore>>;

/// Locks the store. A poisoned lock still yields the state, since every
/// store mutation leaves it consistent before returning.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ChatStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a store for sharing.
pub fn share(store: ChatStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}
