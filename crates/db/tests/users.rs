//! Integration tests for the user repository.

use planroom_db::migrations;
use planroom_db::repositories::UserRepo;
use planroom_db::DbPool;
use sqlx::sqlite::SqlitePoolOptions;

async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database should open");
    migrations::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

#[tokio::test]
async fn upsert_creates_user_on_free_plan() {
    let pool = test_pool().await;

    let user = UserRepo::upsert(&pool, "alice", "Alice").await.unwrap();
    assert_eq!(user.login, "alice");
    assert_eq!(user.name, "Alice");
    assert_eq!(user.plan, "free");
}

#[tokio::test]
async fn upsert_overwrites_name_last_writer_wins() {
    let pool = test_pool().await;

    UserRepo::upsert(&pool, "alice", "Alice").await.unwrap();

    // The plan column belongs to billing, not to profile refresh.
    sqlx::query("UPDATE users SET plan = 'pro' WHERE login = 'alice'")
        .execute(&pool)
        .await
        .unwrap();

    let user = UserRepo::upsert(&pool, "alice", "Alice Liddell").await.unwrap();
    assert_eq!(user.name, "Alice Liddell");
    assert_eq!(user.plan, "pro");
}

#[tokio::test]
async fn find_by_login_absent_user() {
    let pool = test_pool().await;
    let missing = UserRepo::find_by_login(&pool, "nobody").await.unwrap();
    assert!(missing.is_none());
}
