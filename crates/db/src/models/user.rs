//! User identity model.

use serde::Serialize;
use sqlx::FromRow;

/// A user row from the `users` table.
///
/// `login` is the primary identity (provider account name). Rows are
/// created or refreshed on every successful profile fetch and never
/// deleted by the auth subsystem.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub login: String,
    pub name: String,
    /// Subscription plan label, `"free"` unless set elsewhere.
    pub plan: String,
}
