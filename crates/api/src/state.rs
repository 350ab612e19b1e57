use std::sync::Arc;

use crate::auth::service::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: planroom_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Authentication service (cookie codec + provider client + store).
    pub auth: Arc<AuthService>,
}
