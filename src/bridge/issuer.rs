//! Login token issuance.

use anyhow::Context;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::{error::IssueError, record::TokenRecord, service::unix_now, BridgeService};

const ENDPOINT_BYTES: usize = 16;
const KEY_BYTES: usize = 32;

/// A freshly stored token and the link that redeems it.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct IssuedToken {
    pub endpoint: String,
    #[serde(skip)]
    pub key: String,
    pub expiry: i64,
    pub url: String,
}

impl BridgeService {
    /// Issue a login token for `uid`, valid for `ttl_seconds` or the configured default.
    ///
    /// # Errors
    /// Returns [`IssueError`] for a non-positive TTL, an unknown account, or a backend failure.
    pub async fn issue_token(
        &self,
        uid: i64,
        ttl_seconds: Option<i64>,
    ) -> Result<IssuedToken, IssueError> {
        self.issue_token_at(uid, ttl_seconds, unix_now()).await
    }

    /// # Errors
    /// See [`BridgeService::issue_token`].
    pub async fn issue_token_at(
        &self,
        uid: i64,
        ttl_seconds: Option<i64>,
        now: i64,
    ) -> Result<IssuedToken, IssueError> {
        let ttl = ttl_seconds.unwrap_or_else(|| self.config().token_ttl_seconds());
        if ttl <= 0 {
            return Err(IssueError::InvalidTtl(ttl));
        }

        self.accounts()
            .find_account_by_id(uid)
            .await
            .map_err(IssueError::Backend)?
            .ok_or(IssueError::UnknownAccount(uid))?;

        let record = TokenRecord {
            endpoint: random_hex(ENDPOINT_BYTES).map_err(IssueError::Backend)?,
            key: random_hex(KEY_BYTES).map_err(IssueError::Backend)?,
            uid,
            expiry: now.saturating_add(ttl),
        };

        self.tokens()
            .put(&record)
            .await
            .map_err(IssueError::Backend)?;

        info!(account_id = uid, expiry = record.expiry, "login token issued");

        let url = self.config().bridge_url(&record.endpoint, &record.key);
        Ok(IssuedToken {
            endpoint: record.endpoint,
            key: record.key,
            expiry: record.expiry,
            url,
        })
    }
}

fn random_hex(len: usize) -> anyhow::Result<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate login token")?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bridge::{BridgeConfig, LoginOutcome},
        store::{Account, KeyValueStore, MemoryStore},
    };
    use anyhow::Result;
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000;

    async fn service() -> (Arc<MemoryStore>, BridgeService) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account(Account {
                id: 7,
                username: "admin".to_string(),
            })
            .await;
        let service = BridgeService::new(
            BridgeConfig::new("https://example.com".to_string()),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        (store, service)
    }

    #[tokio::test]
    async fn issued_token_is_stored_and_linked() -> Result<()> {
        let (store, service) = service().await;
        let issued = service.issue_token_at(7, None, NOW).await?;

        assert_eq!(issued.endpoint.len(), ENDPOINT_BYTES * 2);
        assert_eq!(issued.key.len(), KEY_BYTES * 2);
        assert_eq!(issued.expiry, NOW + 300);
        assert_eq!(
            issued.url,
            format!(
                "https://example.com/login-bridge/{}/{}",
                issued.endpoint, issued.key
            )
        );

        let stored = store
            .get(&format!("login_bridge_{}", issued.endpoint))
            .await?
            .map(|raw| TokenRecord::parse(&raw))
            .transpose()?;
        assert_eq!(
            stored,
            Some(TokenRecord {
                endpoint: issued.endpoint.clone(),
                key: issued.key.clone(),
                uid: 7,
                expiry: NOW + 300,
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn issued_link_logs_in_once() -> Result<()> {
        let (_, service) = service().await;
        let issued = service.issue_token_at(7, Some(60), NOW).await?;
        let path = format!("/login-bridge/{}/{}", issued.endpoint, issued.key);

        assert!(matches!(
            service.resolve_and_login_at(&path, NOW + 60).await,
            LoginOutcome::Success(_)
        ));
        assert!(matches!(
            service.resolve_and_login_at(&path, NOW + 60).await,
            LoginOutcome::Invalid
        ));
        Ok(())
    }

    #[tokio::test]
    async fn tokens_are_unique() -> Result<()> {
        let (_, service) = service().await;
        let first = service.issue_token_at(7, None, NOW).await?;
        let second = service.issue_token_at(7, None, NOW).await?;
        assert_ne!(first.endpoint, second.endpoint);
        assert_ne!(first.key, second.key);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_non_positive_ttl() {
        let (_, service) = service().await;
        assert!(matches!(
            service.issue_token_at(7, Some(0), NOW).await,
            Err(IssueError::InvalidTtl(0))
        ));
        assert!(matches!(
            service.issue_token_at(7, Some(-5), NOW).await,
            Err(IssueError::InvalidTtl(-5))
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_account() -> Result<()> {
        let (store, service) = service().await;
        assert!(matches!(
            service.issue_token_at(99, None, NOW).await,
            Err(IssueError::UnknownAccount(99))
        ));
        assert!(store.scan_prefix("login_bridge_").await?.is_empty());
        Ok(())
    }

    #[test]
    fn serialized_token_omits_key() -> serde_json::Result<()> {
        let issued = IssuedToken {
            endpoint: "e1".to_string(),
            key: "secret".to_string(),
            expiry: 1,
            url: "https://example.com/login-bridge/e1/secret".to_string(),
        };
        let json = serde_json::to_value(&issued)?;
        assert!(json.get("key").is_none());
        assert_eq!(json["endpoint"], "e1");
        Ok(())
    }
}
