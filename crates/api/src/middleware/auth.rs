//! Cookie-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use planroom_core::error::CoreError;
use planroom_db::models::user::User;

use crate::auth::cookie::{clear_cookie, cookie_value, SESSION_COOKIE};
use crate::auth::service::{AuthError, AuthState};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the sealed session cookie.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(current: CurrentUser) -> AppResult<Json<()>> {
///     tracing::info!(user = %current.user.login, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Handle of the session that authenticated this request.
    pub session_id: String,
}

/// Rejection for [`CurrentUser`].
///
/// An unauthenticated request gets a 401, and if it presented a cookie
/// that failed validation, that cookie is expired in the same response.
#[derive(Debug)]
pub enum AuthRejection {
    Unauthenticated { clear_cookie: bool },
    App(AppError),
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        AuthRejection::App(AppError::Auth(err))
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::App(err) => err.into_response(),
            AuthRejection::Unauthenticated { clear_cookie: clear } => {
                let mut response =
                    AppError::Core(CoreError::Unauthorized("Not logged in".into()))
                        .into_response();
                if clear {
                    if let Ok(value) = HeaderValue::from_str(&clear_cookie(SESSION_COOKIE)) {
                        response.headers_mut().insert(header::SET_COOKIE, value);
                    }
                }
                response
            }
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = cookie_value(&parts.headers, SESSION_COOKIE);

        match state.auth.authenticate(cookie.as_deref()).await? {
            AuthState::Authenticated { user, session_id } => {
                Ok(CurrentUser { user, session_id })
            }
            AuthState::Unauthenticated { clear_cookie } => {
                Err(AuthRejection::Unauthenticated { clear_cookie })
            }
        }
    }
}
