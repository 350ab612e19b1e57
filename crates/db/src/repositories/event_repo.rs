//! Repository for the append-only `events` log.

use chrono::Utc;

use crate::DbPool;

/// Records auth events (login, logout, revocation) for later inspection.
pub struct EventRepo;

impl EventRepo {
    /// Append one event row. `properties` is stored as a JSON blob.
    pub async fn record(
        pool: &DbPool,
        event: &str,
        user: &str,
        properties: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO events (timestamp, event, user, properties)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Utc::now())
        .bind(event)
        .bind(user)
        .bind(properties.to_string())
        .execute(pool)
        .await?;
        Ok(())
    }
}
