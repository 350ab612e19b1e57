//! Shared test fixtures: in-memory database, stub OAuth provider, and
//! a full application router mirroring the production middleware stack.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use planroom_api::auth::cookie::CookieCodec;
use planroom_api::auth::provider::{OAuthProvider, Profile, ProviderError};
use planroom_api::auth::service::AuthService;
use planroom_api::config::{AuthConfig, ServerConfig};
use planroom_api::routes;
use planroom_api::state::AppState;
use planroom_db::DbPool;
use sqlx::sqlite::SqlitePoolOptions;

/// The one authorization code the stub provider accepts.
pub const VALID_CODE: &str = "validcode";
/// The access token the stub hands out for [`VALID_CODE`].
pub const VALID_TOKEN: &str = "abc";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        auth: AuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            cookie_secret: "test-cookie-secret".to_string(),
        },
    }
}

/// Open a migrated in-memory database. A single connection keeps every
/// query on the same store.
pub async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database should open");
    planroom_db::migrations::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

/// Provider double: accepts exactly one code, honors exactly one token.
///
/// With `reject_tokens` set, every profile fetch is refused -- used to
/// simulate upstream token revocation.
pub struct StubProvider {
    pub reject_tokens: bool,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            reject_tokens: false,
        }
    }
}

#[async_trait]
impl OAuthProvider for StubProvider {
    fn authorize_url(&self) -> String {
        "https://provider.test/authorize?client_id=test-client-id\
         &redirect_uri=http://localhost:8080/auth/callback&scope=read:user"
            .to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        if code == VALID_CODE {
            Ok(VALID_TOKEN.to_string())
        } else {
            Err(ProviderError::Rejected {
                status: 400,
                message: "bad_verification_code".to_string(),
            })
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        if self.reject_tokens || access_token != VALID_TOKEN {
            return Err(ProviderError::Rejected {
                status: 401,
                message: "Bad credentials".to_string(),
            });
        }
        Ok(Profile {
            login: "alice".to_string(),
            name: Some("Alice".to_string()),
        })
    }
}

/// Build an [`AuthService`] over the given pool and provider.
pub fn auth_service(pool: DbPool, provider: Arc<dyn OAuthProvider>) -> AuthService {
    let codec = CookieCodec::new(&test_config().auth.cookie_secret);
    AuthService::new(pool, codec, provider)
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses.
pub fn build_test_app(pool: DbPool) -> Router {
    let config = test_config();
    let auth = Arc::new(auth_service(pool.clone(), Arc::new(StubProvider::new())));

    let state = AppState {
        pool,
        config: Arc::new(config),
        auth,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::app_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should complete")
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
