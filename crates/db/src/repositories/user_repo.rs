//! Repository for the `users` table.

use crate::models::user::User;
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "login, name, plan";

/// Provides identity upsert and lookup for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert or refresh a user by primary key, returning the row.
    ///
    /// Last-writer-wins: an existing row's display name is overwritten,
    /// the plan column is left untouched.
    pub async fn upsert(pool: &DbPool, login: &str, name: &str) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (login, name) VALUES (?1, ?2)
             ON CONFLICT(login) DO UPDATE SET name = excluded.name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by login.
    pub async fn find_by_login(pool: &DbPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE login = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }
}
