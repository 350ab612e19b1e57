//! Integration tests for the migration engine: full bootstrap, ledger
//! idempotency, registry order independence, and failure semantics.

use planroom_db::migrations::{self, MIGRATIONS};
use planroom_db::DbPool;
use sqlx::sqlite::SqlitePoolOptions;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open an empty in-memory database. A single connection keeps every
/// query on the same in-memory store.
async fn fresh_pool() -> DbPool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database should open")
}

/// Whether a table exists in the schema.
async fn table_exists(pool: &DbPool, name: &str) -> bool {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(name)
            .fetch_optional(pool)
            .await
            .expect("sqlite_master query should succeed");
    row.is_some()
}

// ---------------------------------------------------------------------------
// Test: full bootstrap reaches the latest version with all tables
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_bootstrap_creates_schema() {
    let pool = fresh_pool().await;

    assert_eq!(migrations::current_version(&pool).await.unwrap(), 0);

    migrations::run_migrations(&pool)
        .await
        .expect("migrations should apply");

    assert_eq!(migrations::current_version(&pool).await.unwrap(), 4);
    for table in ["users", "schema_version", "sessions", "events"] {
        assert!(table_exists(&pool, table).await, "{table} should exist");
    }

    // The ledger is append-only and strictly ascending.
    let versions: Vec<(i64,)> =
        sqlx::query_as("SELECT version FROM schema_version ORDER BY version")
            .fetch_all(&pool)
            .await
            .unwrap();
    let versions: Vec<i64> = versions.into_iter().map(|(v,)| v).collect();
    assert_eq!(versions, vec![1, 2, 3, 4]);
}

// ---------------------------------------------------------------------------
// Test: re-running the pass is a no-op at the ledger level
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rerunning_migrations_is_a_noop() {
    let pool = fresh_pool().await;

    migrations::run_migrations(&pool).await.unwrap();
    let before: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();

    migrations::run_migrations(&pool)
        .await
        .expect("second pass should succeed");

    assert_eq!(migrations::current_version(&pool).await.unwrap(), 4);
    let after: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(before, after, "ledger must not grow on a re-run");
}

// ---------------------------------------------------------------------------
// Test: registration order does not affect the outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_order_does_not_matter() {
    let pool = fresh_pool().await;

    // Base table, as run_migrations would create it.
    sqlx::query("CREATE TABLE users (login TEXT PRIMARY KEY, name TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();

    // First three units (0,1)(1,2)(2,3), registered backwards.
    let mut shuffled = MIGRATIONS[..3].to_vec();
    shuffled.reverse();

    let applied = migrations::apply_migrations(&pool, &shuffled)
        .await
        .expect("shuffled registry should still apply in order");

    assert_eq!(applied, 3);
    assert_eq!(migrations::current_version(&pool).await.unwrap(), 3);
    assert!(table_exists(&pool, "sessions").await);

    // The (1,2) unit's structural change must be present: plan column
    // with its default.
    sqlx::query("INSERT INTO users (login, name) VALUES ('alice', 'Alice')")
        .execute(&pool)
        .await
        .unwrap();
    let (plan,): (String,) = sqlx::query_as("SELECT plan FROM users WHERE login = 'alice'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(plan, "free");
}

// ---------------------------------------------------------------------------
// Test: a failing unit aborts the pass and leaves the ledger untouched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_unit_aborts_pass() {
    let pool = fresh_pool().await;

    // The (1,2) unit alone must fail on an empty store: its ALTER has no
    // users table to touch.
    let result = migrations::apply_migrations(&pool, &MIGRATIONS[1..2]).await;
    assert!(result.is_err(), "unit must fail without its prerequisites");

    // Nothing was recorded: the store is still at version 0.
    assert_eq!(migrations::current_version(&pool).await.unwrap(), 0);
}
