//! The validate-and-consume chain behind every login link.

use anyhow::Result;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

use super::{
    config::BridgeConfig,
    error::{LoginError, Rejection},
    path::parse_bridge_path,
    record::TokenRecord,
    session::{IssuedSession, SessionIssuer},
    tokens::TokenStore,
};
use crate::store::{Account, AccountDirectory, KeyValueStore, SessionStore};

/// Result of one login attempt as seen by the HTTP layer.
#[derive(Debug)]
pub enum LoginOutcome {
    Success(LoginSuccess),
    Invalid,
}

#[derive(Debug)]
pub struct LoginSuccess {
    pub account: Account,
    pub session: IssuedSession,
}

/// Token-gated session issuer with its collaborators injected.
#[derive(Clone)]
pub struct BridgeService {
    config: BridgeConfig,
    tokens: TokenStore,
    accounts: Arc<dyn AccountDirectory>,
    sessions: SessionIssuer,
}

impl BridgeService {
    pub fn new(
        config: BridgeConfig,
        store: Arc<dyn KeyValueStore>,
        accounts: Arc<dyn AccountDirectory>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let tokens = TokenStore::new(store, config.namespace());
        let sessions = SessionIssuer::new(sessions, config.session_ttl_seconds());
        Self {
            config,
            tokens,
            accounts,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub(super) fn accounts(&self) -> &dyn AccountDirectory {
        self.accounts.as_ref()
    }

    /// Resolve a login link at the current time.
    pub async fn resolve_and_login(&self, request_path: &str) -> LoginOutcome {
        self.resolve_and_login_at(request_path, unix_now()).await
    }

    /// Resolve a login link, collapsing every failure into [`LoginOutcome::Invalid`].
    ///
    /// The distinguished reason is logged and then dropped.
    pub async fn resolve_and_login_at(&self, request_path: &str, now: i64) -> LoginOutcome {
        match self.validate_and_consume(request_path, now).await {
            Ok(success) => {
                info!(account_id = success.account.id, "login link accepted");
                LoginOutcome::Success(success)
            }
            Err(LoginError::Backend(err)) => {
                warn!(reason = "backend", "login link failed: {err:#}");
                LoginOutcome::Invalid
            }
            Err(err) => {
                info!(reason = err.reason(), "login link rejected: {err}");
                LoginOutcome::Invalid
            }
        }
    }

    /// Run the full chain and report why it failed.
    ///
    /// The record is taken out of the store before any check on its contents,
    /// so once lookup succeeds it is gone whatever the outcome.
    ///
    /// # Errors
    /// Returns the [`LoginError`] naming the first check that failed.
    #[instrument(skip(self, request_path))]
    pub async fn validate_and_consume(
        &self,
        request_path: &str,
        now: i64,
    ) -> Result<LoginSuccess, LoginError> {
        let path = parse_bridge_path(request_path, self.config.marker())?;

        let raw = self
            .tokens
            .take(path.endpoint)
            .await
            .map_err(LoginError::Backend)?
            .ok_or(LoginError::TokenNotFound)?;

        debug!("login token taken from store");

        let record = TokenRecord::parse(&raw)?;

        if record.endpoint != path.endpoint {
            return Err(LoginError::FieldMismatchOrExpired(
                Rejection::EndpointMismatch,
            ));
        }

        if !keys_match(path.public_key, &record.key) {
            return Err(LoginError::FieldMismatchOrExpired(Rejection::KeyMismatch));
        }

        if record.is_expired_at(now) {
            return Err(LoginError::FieldMismatchOrExpired(Rejection::Expired));
        }

        let account = self
            .accounts
            .find_account_by_id(record.uid)
            .await
            .map_err(LoginError::Backend)?
            .ok_or(LoginError::UnknownAccount(record.uid))?;

        let session = self
            .sessions
            .establish_session(&account, true)
            .await
            .map_err(LoginError::Backend)?;

        Ok(LoginSuccess { account, session })
    }

    /// # Errors
    /// Returns an error if the token store is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.tokens.ping().await
    }
}

impl std::fmt::Debug for BridgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeService")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

/// Exact byte comparison in constant time.
fn keys_match(presented: &str, stored: &str) -> bool {
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
