//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// GET  /login     -> redirect to the provider
/// GET  /callback  -> complete a login (sets the session cookie)
/// POST /logout    -> end the session (clears the cookie)
/// GET  /me        -> current user (requires auth)
/// GET  /session   -> session status (any request)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/session", get(auth::session))
}
