//! Versioned schema migrations over an append-only version ledger.
//!
//! The current schema version is the highest entry in the
//! `schema_version` table; version 0 means the ledger does not exist
//! yet. Migration units form a statically compiled registry, are sorted
//! by their `from` version before application, and each unit commits
//! its schema change together with its ledger entry in one transaction.
//! Migrations are forward-only: a failing unit aborts the pass and the
//! ledger reflects only fully completed units.

use futures::future::BoxFuture;
use sqlx::SqliteConnection;

use crate::DbPool;

/// Signature of a migration body. Runs inside the unit's transaction.
type MigrationFn = for<'c> fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<(), sqlx::Error>>;

/// A single schema transformation from one version to the next.
#[derive(Clone, Copy)]
pub struct MigrationUnit {
    pub from: i64,
    pub to: i64,
    run: MigrationFn,
}

/// Error raised by a migration pass. Fatal at startup: the process must
/// not serve traffic against a partially migrated schema.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration {from} -> {to} failed: {source}")]
    Unit {
        from: i64,
        to: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration bookkeeping failed: {0}")]
    Store(#[from] sqlx::Error),
}

/// The production migration registry.
///
/// Registration order is irrelevant -- [`apply_migrations`] sorts by
/// `from` before applying. Bodies are written to be safe to run at most
/// once, with IF-NOT-EXISTS guards on structural changes where SQLite
/// allows them.
pub const MIGRATIONS: &[MigrationUnit] = &[
    MigrationUnit {
        from: 0,
        to: 1,
        run: create_version_ledger,
    },
    MigrationUnit {
        from: 1,
        to: 2,
        run: add_user_plan_column,
    },
    MigrationUnit {
        from: 2,
        to: 3,
        run: create_sessions_table,
    },
    MigrationUnit {
        from: 3,
        to: 4,
        run: create_events_table,
    },
];

/// Read the current schema version from the ledger.
///
/// Returns 0 when the ledger table has not been created yet.
pub async fn current_version(pool: &DbPool) -> Result<i64, sqlx::Error> {
    let ledger: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_optional(pool)
    .await?;

    if ledger.is_none() {
        return Ok(0);
    }

    let (version,): (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every unit the ledger does not yet reflect, in `from` order.
///
/// A unit runs only while `from >= v` and `to > v` for the advancing
/// current version `v`. Returns the number of units applied.
pub async fn apply_migrations(pool: &DbPool, units: &[MigrationUnit]) -> Result<u32, MigrationError> {
    let mut ordered: Vec<&MigrationUnit> = units.iter().collect();
    ordered.sort_by_key(|unit| unit.from);

    let mut version = current_version(pool).await?;
    let mut applied = 0u32;

    for unit in ordered {
        if unit.from < version || unit.to <= version {
            continue;
        }

        let mut tx = pool.begin().await?;
        (unit.run)(&mut *tx).await.map_err(|source| MigrationError::Unit {
            from: unit.from,
            to: unit.to,
            source,
        })?;

        // Ledger append rides in the unit's transaction: either both
        // land or neither does.
        sqlx::query("INSERT INTO schema_version (version) VALUES (?1)")
            .bind(unit.to)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrationError::Unit {
                from: unit.from,
                to: unit.to,
                source,
            })?;
        tx.commit().await?;

        tracing::info!(from = unit.from, to = unit.to, "Applied schema migration");
        version = unit.to;
        applied += 1;
    }

    Ok(applied)
}

/// Bring the store fully up to date: base tables plus the production
/// registry. Must complete before any repository touches the pool.
pub async fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    // The users base table predates the version ledger.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            login TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let version = current_version(pool).await?;
    tracing::info!(version, "Database schema version");

    let applied = apply_migrations(pool, MIGRATIONS).await?;
    tracing::info!(applied, "Schema migrations complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Migration bodies
// ---------------------------------------------------------------------------

/// 0 -> 1: create the `schema_version` ledger itself.
fn create_version_ledger(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(conn)
        .await?;
        Ok(())
    })
}

/// 1 -> 2: add the subscription plan column to users.
fn add_user_plan_column(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        sqlx::query("ALTER TABLE users ADD COLUMN plan TEXT NOT NULL DEFAULT 'free'")
            .execute(conn)
            .await?;
        Ok(())
    })
}

/// 2 -> 3: create the sessions table with its lookup index.
fn create_sessions_table(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(login),
                access_token TEXT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_expiry
             ON sessions(session_id, expires_at)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    })
}

/// 3 -> 4: create the append-only auth event log.
fn create_events_table(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                event TEXT NOT NULL,
                user TEXT NOT NULL,
                properties TEXT
            )",
        )
        .execute(conn)
        .await?;
        Ok(())
    })
}
