/// Server configuration loaded from environment variables.
///
/// All fields except the OAuth client credentials have defaults suitable
/// for local development. In production, override via environment
/// variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// OAuth and cookie configuration.
    pub auth: AuthConfig,
}

/// OAuth client credentials and the cookie sealing secret.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Callback URL registered with the provider.
    pub redirect_uri: String,
    /// Secret the cookie sealing key is derived from.
    pub cookie_secret: String,
}

/// Placeholder secret used when `COOKIE_SECRET` is unset. Anyone who
/// knows it can mint valid cookies, so production must override it.
const INSECURE_COOKIE_SECRET: &str = "default-secret-key";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8080`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let auth = AuthConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            auth,
        }
    }
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// | Env Var         | Required | Default                                |
    /// |-----------------|----------|----------------------------------------|
    /// | `CLIENT_ID`     | **yes**  | --                                     |
    /// | `CLIENT_SECRET` | **yes**  | --                                     |
    /// | `REDIRECT_URI`  | no       | `http://localhost:8080/auth/callback`  |
    /// | `COOKIE_SECRET` | no       | insecure placeholder (see below)       |
    ///
    /// # Panics
    ///
    /// Panics if `CLIENT_ID` or `CLIENT_SECRET` is not set.
    pub fn from_env() -> Self {
        let client_id =
            std::env::var("CLIENT_ID").expect("CLIENT_ID must be set in the environment");
        let client_secret =
            std::env::var("CLIENT_SECRET").expect("CLIENT_SECRET must be set in the environment");

        let redirect_uri = std::env::var("REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8080/auth/callback".into());

        let cookie_secret = std::env::var("COOKIE_SECRET").unwrap_or_else(|_| {
            tracing::warn!(
                "COOKIE_SECRET is not set; falling back to an insecure default. \
                 All sealed cookies are forgeable until this is configured."
            );
            INSECURE_COOKIE_SECRET.into()
        });

        Self {
            client_id,
            client_secret,
            redirect_uri,
            cookie_secret,
        }
    }
}
