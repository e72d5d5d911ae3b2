//! Session establishment and the session cookie.

use anyhow::{Context, Result};
use axum::http::{header::InvalidHeaderValue, HeaderValue};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::config::BridgeConfig;
use crate::store::{Account, SessionStore};

pub const SESSION_COOKIE_NAME: &str = "login_bridge_session";

/// Raw session token plus the cookie lifetime to hand to the browser.
pub struct IssuedSession {
    pub token: String,
    /// `None` for a browser-session cookie.
    pub max_age: Option<i64>,
}

impl std::fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSession")
            .field("token", &"***")
            .field("max_age", &self.max_age)
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionIssuer {
    sessions: Arc<dyn SessionStore>,
    ttl_seconds: i64,
}

impl SessionIssuer {
    pub fn new(sessions: Arc<dyn SessionStore>, ttl_seconds: i64) -> Self {
        Self {
            sessions,
            ttl_seconds,
        }
    }

    /// Create and persist a session for `account`.
    ///
    /// The stored row always carries the configured TTL; `persistent` only
    /// decides whether the cookie outlives the browser session.
    ///
    /// # Errors
    /// Returns an error if randomness is unavailable or the session cannot be stored.
    pub async fn establish_session(
        &self,
        account: &Account,
        persistent: bool,
    ) -> Result<IssuedSession> {
        // Only the hash is stored; the raw value goes into the cookie.
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        self.sessions
            .insert_session(account.id, &token_hash, self.ttl_seconds)
            .await?;

        Ok(IssuedSession {
            token,
            max_age: persistent.then_some(self.ttl_seconds),
        })
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build a secure `HttpOnly` cookie for the session token.
///
/// # Errors
/// Returns an error if the token contains bytes not allowed in a header.
pub fn session_cookie(
    config: &BridgeConfig,
    session: &IssuedSession,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
        session.token
    );
    if let Some(max_age) = session.max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
