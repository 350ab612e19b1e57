//! Repository for the `sessions` table.

use chrono::Utc;
use uuid::Uuid;

use crate::models::session::Session;
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "session_id, user_id, access_token, expires_at, created_at";

/// Fixed session lifetime. Expiry is never extended in place -- renewal
/// requires a fresh login.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Provides create/resolve/delete operations for login sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session for the user, returning the opaque handle.
    ///
    /// The handle is a UUID v4 (122 bits of entropy), so collisions are
    /// negligible and the primary key stays the uniqueness authority.
    pub async fn create(
        pool: &DbPool,
        user_id: &str,
        access_token: &str,
    ) -> Result<String, sqlx::Error> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(SESSION_TTL_DAYS);

        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, access_token, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(access_token)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(session_id)
    }

    /// Look up a live session by handle.
    ///
    /// An expired row is filtered by the query predicate, not deleted
    /// here -- absence from this result is what callers rely on.
    pub async fn resolve(
        pool: &DbPool,
        session_id: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE session_id = ?1 AND expires_at > ?2"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Remove a session. Deleting a nonexistent handle is a no-op.
    pub async fn delete(pool: &DbPool, session_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
