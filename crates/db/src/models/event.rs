//! Auth event log model. Immutable once written (no update DTO).

use planroom_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A single event log entry from the `events` table.
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: DbId,
    pub timestamp: Timestamp,
    pub event: String,
    pub user: String,
    /// JSON-encoded free-form properties.
    pub properties: Option<String>,
}
