//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the versioned on-disk schema. They stay private to the
//! infrastructure layer and absorb schema evolution, so domain types in
//! `gemchat-core` never carry version tags.
//!
//! ## Schema Versioning (Semantic Versioning)
//!
//! - **MAJOR (X.0.0)**: Breaking changes (field removal, type changes)
//! - **MINOR (1.X.0)**: Backward-compatible additions (new optional fields)
//! - **PATCH (1.0.X)**: Backward-compatible fixes (not typically used for schema)

mod snapshot;

pub use snapshot::{
    AppSnapshotDTO, AppSnapshotV1_0_0, ChatroomV1_0_0, MessageV1_0_0, SNAPSHOT_ENTITY,
    SessionV1_0_0, create_snapshot_migrator,
};
