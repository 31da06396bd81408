//! AppSnapshot DTOs and migrations
//!
//! ## Version History
//! - **1.0.0**: Initial schema (`user`, `chatrooms`, `selectedChatId`,
//!   `dark`, `sidebarVisible`) plus the `version` tag.

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use gemchat_core::chat::{Chatroom, Message, MessageRole};
use gemchat_core::error::{ChatError, Result};
use gemchat_core::session::Session;
use gemchat_core::state::AppSnapshot;

/// Entity name registered with the migrator.
pub const SNAPSHOT_ENTITY: &str = "app_snapshot";

// ============================================================================
// Nested DTOs
// ============================================================================

/// Session DTO V1.0.0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionV1_0_0 {
    pub phone: String,
    pub country_code: String,
}

/// Message DTO V1.0.0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageV1_0_0 {
    pub id: String,
    /// `"user"` or `"ai"` (`"assistant"` accepted on read)
    pub role: MessageRole,
    #[serde(default)]
    pub text: String,
    pub created_at: i64,
    /// Data URI; `null` is accepted for text-only messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Chatroom DTO V1.0.0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatroomV1_0_0 {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    #[serde(default)]
    pub messages: Vec<MessageV1_0_0>,
}

impl From<Session> for SessionV1_0_0 {
    fn from(session: Session) -> Self {
        SessionV1_0_0 {
            phone: session.phone,
            country_code: session.country_code,
        }
    }
}

impl From<SessionV1_0_0> for Session {
    fn from(dto: SessionV1_0_0) -> Self {
        Session {
            phone: dto.phone,
            country_code: dto.country_code,
        }
    }
}

impl From<Message> for MessageV1_0_0 {
    fn from(message: Message) -> Self {
        MessageV1_0_0 {
            id: message.id,
            role: message.role,
            text: message.text,
            created_at: message.created_at,
            image: message.image,
        }
    }
}

impl From<MessageV1_0_0> for Message {
    fn from(dto: MessageV1_0_0) -> Self {
        Message {
            id: dto.id,
            role: dto.role,
            text: dto.text,
            created_at: dto.created_at,
            image: dto.image,
        }
    }
}

impl From<Chatroom> for ChatroomV1_0_0 {
    fn from(room: Chatroom) -> Self {
        ChatroomV1_0_0 {
            id: room.id,
            title: room.title,
            created_at: room.created_at,
            messages: room.messages.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ChatroomV1_0_0> for Chatroom {
    fn from(dto: ChatroomV1_0_0) -> Self {
        Chatroom {
            id: dto.id,
            title: dto.title,
            created_at: dto.created_at,
            messages: dto.messages.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// AppSnapshot DTOs
// ============================================================================

/// Application snapshot V1.0.0
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshotV1_0_0 {
    #[serde(default)]
    pub user: Option<SessionV1_0_0>,
    #[serde(default)]
    pub chatrooms: Vec<ChatroomV1_0_0>,
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

/// Type alias for the latest snapshot version.
pub type AppSnapshotDTO = AppSnapshotV1_0_0;

/// Convert AppSnapshotV1_0_0 DTO to domain model
impl IntoDomain<AppSnapshot> for AppSnapshotV1_0_0 {
    fn into_domain(self) -> AppSnapshot {
        AppSnapshot {
            user: self.user.map(Into::into),
            chatrooms: self.chatrooms.into_iter().map(Into::into).collect(),
            selected_chat_id: self.selected_chat_id,
            dark: self.dark,
            sidebar_visible: self.sidebar_visible,
        }
    }
}

/// Convert domain model to AppSnapshotV1_0_0 DTO for persistence
impl FromDomain<AppSnapshot> for AppSnapshotV1_0_0 {
    fn from_domain(snapshot: AppSnapshot) -> Self {
        AppSnapshotV1_0_0 {
            user: snapshot.user.map(Into::into),
            chatrooms: snapshot.chatrooms.into_iter().map(Into::into).collect(),
            selected_chat_id: snapshot.selected_chat_id,
            dark: snapshot.dark,
            sidebar_visible: snapshot.sidebar_visible,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for AppSnapshot entities.
///
/// # Migration Path
///
/// - V1.0.0 → AppSnapshot: Converts DTO to domain model
pub fn create_snapshot_migrator() -> Result<version_migrate::Migrator> {
    version_migrate::migrator!("app_snapshot" => [AppSnapshotV1_0_0, AppSnapshot], save = true)
        .map_err(|e| ChatError::migration(format!("Failed to create snapshot migrator: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::chat::INBOX_ID;

    #[test]
    fn test_snapshot_migrator_creation() {
        assert!(create_snapshot_migrator().is_ok());
    }

    #[test]
    fn test_load_v1_0_0() {
        let migrator = create_snapshot_migrator().unwrap();
        let json = serde_json::json!({
            "version": "1.0.0",
            "user": { "phone": "5551234567", "countryCode": "+1" },
            "chatrooms": [{
                "id": "inbox",
                "title": "General",
                "createdAt": 1700000000000i64,
                "messages": [
                    { "id": "m1", "role": "user", "text": "hi", "createdAt": 1700000000001i64, "image": null },
                    { "id": "m2", "role": "ai", "text": "Gemini: hi (simulated reply)", "createdAt": 1700000002401i64 }
                ]
            }],
            "selectedChatId": "inbox",
            "dark": true,
            "sidebarVisible": false
        });

        let result: std::result::Result<AppSnapshot, _> =
            migrator.load_flat_from(SNAPSHOT_ENTITY, json);

        assert!(result.is_ok(), "Migration failed: {:?}", result.err());
        let snapshot = result.unwrap();
        assert_eq!(snapshot.user.unwrap().country_code, "+1");
        assert_eq!(snapshot.selected_chat_id.as_deref(), Some(INBOX_ID));
        assert!(snapshot.dark);
        assert!(!snapshot.sidebar_visible);
        let messages = &snapshot.chatrooms[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert!(messages[0].image.is_none());
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_save_includes_version_and_layout() {
        let migrator = create_snapshot_migrator().unwrap();
        let snapshot = AppSnapshot::seeded(1);

        let json_str = migrator
            .save_domain_flat(SNAPSHOT_ENTITY, &snapshot)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(value["version"], "1.0.0");
        assert!(value["user"].is_null());
        assert_eq!(value["selectedChatId"], "inbox");
        assert_eq!(value["chatrooms"][0]["title"], "General");
        assert_eq!(value["dark"], false);
        assert_eq!(value["sidebarVisible"], true);
    }
}
