//! Sealed cookie codec.
//!
//! A sealed cookie is the AES-256-GCM encryption of a JSON payload
//! `{value, expires}`, base64-encoded for the wire. The key is derived
//! by hashing the deployment secret, so the raw secret never feeds the
//! cipher and rotating it invalidates every outstanding cookie at once.
//! Without the secret a token is neither readable nor forgeable.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Name of the session cookie. Deployment-specific prefix keeps it from
/// colliding with other apps on the same host.
pub const SESSION_COOKIE: &str = "planroom_session_id";

/// AES-GCM nonce length in bytes, prepended to the ciphertext.
const NONCE_LEN: usize = 12;

/// Sealing can only fail before encryption ever sees client input.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cookie encryption failed")]
    Encrypt,
}

/// The self-expiring envelope around a sealed value. The embedded
/// expiry lets a cookie invalidate itself even before a store lookup.
#[derive(Serialize, Deserialize)]
struct Payload<T> {
    value: T,
    expires: DateTime<Utc>,
}

/// Seals values into opaque cookie strings and opens them again.
///
/// Pure and CPU-bound; safe to share across request handlers.
#[derive(Clone)]
pub struct CookieCodec {
    cipher: Aes256Gcm,
}

impl CookieCodec {
    /// Build a codec from the deployment secret.
    ///
    /// The cipher key is the SHA-256 digest of the secret, which also
    /// maps an arbitrary-length secret onto the cipher's exact key size.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Seal a value into an opaque token that expires after `ttl`.
    pub fn seal<T: Serialize>(&self, value: &T, ttl: Duration) -> Result<String, CookieError> {
        let payload = Payload {
            value,
            expires: Utc::now() + ttl,
        };
        let plaintext = serde_json::to_vec(&payload)?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| CookieError::Encrypt)?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Open a sealed token, returning its value if everything checks out.
    ///
    /// Tampering, a wrong key, malformed structure, and expiry all
    /// produce the same `None` -- callers (and attackers probing the
    /// endpoint) learn nothing about which check failed.
    pub fn open<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        let raw = URL_SAFE_NO_PAD.decode(token).ok()?;
        if raw.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .ok()?;
        let payload: Payload<T> = serde_json::from_slice(&plaintext).ok()?;

        if payload.expires <= Utc::now() {
            return None;
        }
        Some(payload.value)
    }
}

// ---------------------------------------------------------------------------
// Cookie header helpers
// ---------------------------------------------------------------------------

/// Extract a cookie's value from a request's `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Build a `Set-Cookie` value for a session cookie.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Build a `Set-Cookie` value that expires the cookie immediately.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
