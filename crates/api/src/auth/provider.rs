//! OAuth provider client (authorization-code grant).
//!
//! The [`OAuthProvider`] trait is the seam between the auth flow and
//! the network: production uses [`GithubProvider`], tests substitute a
//! stub. Provider calls are the only network-bound step in the request
//! lifecycle, so the client enforces a hard timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

use crate::config::AuthConfig;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_API_URL: &str = "https://api.github.com/user";

/// Upper bound on any single provider call.
const PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Errors from talking to the identity provider.
///
/// Messages carry no credentials; they are safe to surface to users.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached (includes timeouts).
    #[error("Provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered and said no.
    #[error("The login provider rejected the request: {message}")]
    Rejected { status: u16, message: String },

    /// A 2xx response without the expected `access_token` field.
    #[error("The login provider response was missing an access token")]
    MissingToken,
}

/// Minimal profile returned by the provider's user endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
}

impl Profile {
    /// Display name, falling back to the login when the profile has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.login)
    }
}

/// The identity provider as the auth flow sees it.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to in order to begin a login.
    fn authorize_url(&self) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Fetch the profile an access token belongs to.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError>;
}

/// Token endpoint response body. GitHub reports errors in-band with a
/// 200 status, so both shapes share one struct.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub-backed [`OAuthProvider`] implementation.
pub struct GithubProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GithubProvider {
    pub fn new(config: &AuthConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            // The profile API refuses requests without a User-Agent.
            .user_agent(concat!("planroom/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("HTTP client construction with static options cannot fail");

        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&scope=read:user",
            self.client_id, self.redirect_uri
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: TokenResponse = match response.json::<TokenResponse>().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message: "Unknown error".to_string(),
                })
            }
            Err(err) => return Err(ProviderError::Network(err)),
        };

        match body.access_token {
            Some(token) if status.is_success() => Ok(token),
            _ => match body.error_description.or(body.error) {
                Some(message) => Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message,
                }),
                None if status.is_success() => Err(ProviderError::MissingToken),
                None => Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message: "Unknown error".to_string(),
                }),
            },
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let response = self
            .http
            .get(USER_API_URL)
            .header(header::AUTHORIZATION, format!("token {access_token}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: "The access token was not accepted".to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            cookie_secret: "irrelevant".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_client_identity() {
        let provider = GithubProvider::new(&test_config());
        let url = provider.authorize_url();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("redirect_uri=http://localhost:8080/auth/callback"));
        assert!(url.contains("scope=read:user"));
    }

    #[test]
    fn test_profile_display_name_falls_back_to_login() {
        let anonymous = Profile {
            login: "ghost".to_string(),
            name: None,
        };
        assert_eq!(anonymous.display_name(), "ghost");

        let named = Profile {
            login: "alice".to_string(),
            name: Some("Alice".to_string()),
        };
        assert_eq!(named.display_name(), "Alice");
    }
}
