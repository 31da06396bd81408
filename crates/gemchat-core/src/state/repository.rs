//! State repository trait.

use crate::error::Result;
use crate::state::model::AppSnapshot;

/// Durable slot holding the application snapshot.
///
/// Calls are synchronous: the store persists inside its mutation operations,
/// which must stay synchronous for callers.
pub trait StateRepository: Send + Sync {
    /// Loads the stored snapshot, `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<AppSnapshot>>;

    /// Overwrites the stored snapshot.
    fn save(&self, snapshot: &AppSnapshot) -> Result<()>;

    /// Removes the stored snapshot.
    fn clear(&self) -> Result<()>;
}
