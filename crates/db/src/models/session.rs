//! Login session model.

use planroom_core::types::Timestamp;
use sqlx::FromRow;

/// A session row from the `sessions` table.
///
/// Carries the provider access token -- NEVER serialize this struct to
/// an API response or log its token field.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub access_token: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}
