//! Handlers for the `/auth` resource (login, callback, logout, session).

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use planroom_db::models::user::User;
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{clear_cookie, cookie_value, set_cookie, SESSION_COOKIE};
use crate::auth::service::AuthState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Max-Age for the session cookie, aligned with the session TTL.
const COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters the provider appends to the callback redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// Body of `GET /auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /auth/login
///
/// Redirect the browser to the provider's authorization page.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.auth.begin_login())
}

/// GET /auth/callback?code=...
///
/// Complete a login: exchange the code, establish the session, set the
/// sealed cookie, and land the user back on the home page.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let outcome = state.auth.handle_callback(&code).await?;

    let cookie = set_cookie(SESSION_COOKIE, &outcome.cookie, COOKIE_MAX_AGE_SECS);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

/// POST /auth/logout
///
/// Delete the session and expire the cookie. 204 either way -- logging
/// out without a session is not an error.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie = cookie_value(&headers, SESSION_COOKIE);
    state.auth.logout(cookie.as_deref()).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))],
    )
        .into_response())
}

/// GET /auth/me
///
/// The authenticated user's identity.
pub async fn me(current: CurrentUser) -> Json<DataResponse<User>> {
    Json(DataResponse { data: current.user })
}

/// GET /auth/session
///
/// Session status for any request, authenticated or not. A cookie that
/// failed validation is expired in the same response so stale values
/// do not linger in the browser.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie = cookie_value(&headers, SESSION_COOKIE);

    let response = match state.auth.authenticate(cookie.as_deref()).await? {
        AuthState::Authenticated { user, .. } => Json(DataResponse {
            data: SessionStatus {
                authenticated: true,
                user: Some(user),
            },
        })
        .into_response(),
        AuthState::Unauthenticated { clear_cookie: true } => (
            [(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))],
            Json(DataResponse {
                data: SessionStatus {
                    authenticated: false,
                    user: None,
                },
            }),
        )
            .into_response(),
        AuthState::Unauthenticated {
            clear_cookie: false,
        } => Json(DataResponse {
            data: SessionStatus {
                authenticated: false,
                user: None,
            },
        })
        .into_response(),
    };

    Ok(response)
}
