//! The per-request authentication state machine.
//!
//! Reconciles four sources of truth on every request: the sealed
//! cookie, the session store, the user directory, and (at a bounded
//! frequency) the identity provider. All state flows through explicit
//! arguments and return values; nothing request-scoped lives in the
//! service itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use planroom_db::models::user::User;
use planroom_db::repositories::{EventRepo, SessionRepo, UserRepo};
use planroom_db::DbPool;

use super::cookie::{CookieCodec, CookieError};
use super::provider::{OAuthProvider, ProviderError};

/// How often an authenticated session's token is re-checked against the
/// provider. Between checks the store alone answers.
const REVALIDATE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Sealed cookie lifetime, aligned with the session row's fixed TTL.
const COOKIE_TTL_DAYS: i64 = 30;

/// Outcome of evaluating one request's credentials.
#[derive(Debug)]
pub enum AuthState {
    Authenticated { user: User, session_id: String },
    /// `clear_cookie` is set when a cookie was presented but failed,
    /// so stale or forged values get evicted from the browser.
    Unauthenticated { clear_cookie: bool },
}

/// Errors the auth flow can surface to a caller.
///
/// A failed cookie or missing session is NOT an error -- those are the
/// unauthenticated path. Errors here mean the flow itself broke.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Session store unavailable: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Cookie(#[from] CookieError),
}

/// A completed login: the user plus the sealed cookie to hand back.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub session_id: String,
    pub cookie: String,
}

/// Ties the cookie codec, session store, and provider client together.
pub struct AuthService {
    pool: DbPool,
    codec: CookieCodec,
    provider: Arc<dyn OAuthProvider>,
    /// Last provider re-check per session. A timing cache only --
    /// authoritative session state lives in the store.
    revalidated: Mutex<HashMap<String, Instant>>,
}

impl AuthService {
    pub fn new(pool: DbPool, codec: CookieCodec, provider: Arc<dyn OAuthProvider>) -> Self {
        Self {
            pool,
            codec,
            provider,
            revalidated: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate the session cookie of one request.
    ///
    /// Store errors surface as [`AuthError::Store`]; they are never
    /// reported as "not logged in".
    pub async fn authenticate(&self, cookie: Option<&str>) -> Result<AuthState, AuthError> {
        // 1. No cookie: nothing to validate, nothing to clear.
        let Some(token) = cookie else {
            return Ok(AuthState::Unauthenticated {
                clear_cookie: false,
            });
        };

        // 2. Unseal. Tampered, foreign, and expired cookies all fail the
        //    same way.
        let Some(session_id) = self.codec.open::<String>(token) else {
            return Ok(AuthState::Unauthenticated { clear_cookie: true });
        };

        // 3. Resolve the handle.
        let Some(session) = SessionRepo::resolve(&self.pool, &session_id).await? else {
            // An expired row may still sit under this handle; clean it up.
            SessionRepo::delete(&self.pool, &session_id).await?;
            return Ok(AuthState::Unauthenticated { clear_cookie: true });
        };

        // 4. Periodically confirm the provider still honors the token.
        if self.needs_revalidation(&session.session_id) {
            match self.provider.fetch_profile(&session.access_token).await {
                Ok(profile) => {
                    // Profile fetches refresh the directory entry.
                    UserRepo::upsert(&self.pool, &profile.login, profile.display_name()).await?;
                    self.mark_revalidated(&session.session_id);
                }
                Err(ProviderError::Rejected { .. }) => {
                    // Token revoked upstream: the session dies with it.
                    tracing::info!(
                        user = %session.user_id,
                        "Provider rejected access token, ending session"
                    );
                    SessionRepo::delete(&self.pool, &session.session_id).await?;
                    EventRepo::record(
                        &self.pool,
                        "session_revoked",
                        &session.user_id,
                        serde_json::json!({}),
                    )
                    .await?;
                    self.forget(&session.session_id);
                    return Ok(AuthState::Unauthenticated { clear_cookie: true });
                }
                Err(error) => {
                    // A flaky provider must not log everyone out; the
                    // next interval retries.
                    tracing::warn!(%error, "Provider re-validation unavailable, keeping session");
                }
            }
        }

        // 5. Load the identity the session points at.
        let Some(user) = UserRepo::find_by_login(&self.pool, &session.user_id).await? else {
            SessionRepo::delete(&self.pool, &session.session_id).await?;
            return Ok(AuthState::Unauthenticated { clear_cookie: true });
        };

        Ok(AuthState::Authenticated {
            user,
            session_id: session.session_id,
        })
    }

    /// The provider URL a login attempt should redirect to.
    pub fn begin_login(&self) -> String {
        self.provider.authorize_url()
    }

    /// Complete the authorization-code callback.
    ///
    /// A callback while already authenticated is just a fresh login; the
    /// new cookie supersedes the old one.
    pub async fn handle_callback(&self, code: &str) -> Result<LoginOutcome, AuthError> {
        // 1. Exchange the code. Provider trouble here is an
        //    authentication failure the user re-initiates, never a crash.
        let access_token = self.provider.exchange_code(code).await?;

        // 2. The token is only useful if it resolves to a profile.
        let profile = self.provider.fetch_profile(&access_token).await?;

        // 3. Record identity and session. The cookie carries the opaque
        //    handle only; the provider token stays server-side.
        let user = UserRepo::upsert(&self.pool, &profile.login, profile.display_name()).await?;
        let session_id = SessionRepo::create(&self.pool, &user.login, &access_token).await?;
        let cookie = self
            .codec
            .seal(&session_id, chrono::Duration::days(COOKIE_TTL_DAYS))?;

        self.mark_revalidated(&session_id);
        EventRepo::record(&self.pool, "login", &user.login, serde_json::json!({})).await?;
        tracing::info!(user = %user.login, "Login completed");

        Ok(LoginOutcome {
            user,
            session_id,
            cookie,
        })
    }

    /// End the session named by the request's cookie, if any.
    ///
    /// Idempotent: logging out without a live session succeeds quietly.
    pub async fn logout(&self, cookie: Option<&str>) -> Result<(), AuthError> {
        let Some(session_id) = cookie.and_then(|token| self.codec.open::<String>(token)) else {
            return Ok(());
        };

        if let Some(session) = SessionRepo::resolve(&self.pool, &session_id).await? {
            EventRepo::record(
                &self.pool,
                "logout",
                &session.user_id,
                serde_json::json!({}),
            )
            .await?;
            tracing::info!(user = %session.user_id, "Logout completed");
        }

        SessionRepo::delete(&self.pool, &session_id).await?;
        self.forget(&session_id);
        Ok(())
    }

    fn needs_revalidation(&self, session_id: &str) -> bool {
        let map = self.revalidated.lock().unwrap_or_else(|p| p.into_inner());
        match map.get(session_id) {
            Some(last) => last.elapsed() >= REVALIDATE_INTERVAL,
            None => true,
        }
    }

    fn mark_revalidated(&self, session_id: &str) {
        let mut map = self.revalidated.lock().unwrap_or_else(|p| p.into_inner());
        map.insert(session_id.to_string(), Instant::now());
    }

    fn forget(&self, session_id: &str) {
        let mut map = self.revalidated.lock().unwrap_or_else(|p| p.into_inner());
        map.remove(session_id);
    }
}
