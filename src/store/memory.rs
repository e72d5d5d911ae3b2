//! In-process backend for tests and local runs.

use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{Account, AccountDirectory, KeyValueStore, SessionStore, StoreFuture};

/// Session row kept by [`MemoryStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemorySession {
    pub account_id: i64,
    pub token_hash: Vec<u8>,
    pub ttl_seconds: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    options: Mutex<HashMap<String, String>>,
    accounts: Mutex<HashMap<i64, Account>>,
    sessions: Mutex<Vec<MemorySession>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, account: Account) {
        self.accounts.lock().await.insert(account.id, account);
    }

    pub async fn sessions(&self) -> Vec<MemorySession> {
        self.sessions.lock().await.clone()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.options.lock().await.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { anyhow::Ok(self.options.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.options
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            anyhow::Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move { anyhow::Ok(self.options.lock().await.remove(key).is_some()) })
    }

    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        // Lookup and removal share one lock acquisition.
        Box::pin(async move { anyhow::Ok(self.options.lock().await.remove(key)) })
    }

    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<(String, String)>> {
        Box::pin(async move {
            let options = self.options.lock().await;
            let mut entries: Vec<(String, String)> = options
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            entries.sort();
            anyhow::Ok(entries)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { anyhow::Ok(()) })
    }
}

impl AccountDirectory for MemoryStore {
    fn find_account_by_id(&self, id: i64) -> StoreFuture<'_, Option<Account>> {
        Box::pin(async move { anyhow::Ok(self.accounts.lock().await.get(&id).cloned()) })
    }
}

impl SessionStore for MemoryStore {
    fn insert_session<'a>(
        &'a self,
        account_id: i64,
        token_hash: &'a [u8],
        ttl_seconds: i64,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.sessions.lock().await.push(MemorySession {
                account_id,
                token_hash: token_hash.to_vec(),
                ttl_seconds,
            });
            anyhow::Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::Arc;

    #[tokio::test]
    async fn take_removes_the_entry() -> Result<()> {
        let store = MemoryStore::new();
        store.set("login_bridge_e1", "{}").await?;

        assert_eq!(store.take("login_bridge_e1").await?, Some("{}".to_string()));
        assert_eq!(store.take("login_bridge_e1").await?, None);
        assert!(!store.contains_key("login_bridge_e1").await);
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_presence() -> Result<()> {
        let store = MemoryStore::new();
        store.set("a", "1").await?;
        assert!(store.delete("a").await?);
        assert!(!store.delete("a").await?);
        Ok(())
    }

    #[tokio::test]
    async fn scan_prefix_only_returns_namespace() -> Result<()> {
        let store = MemoryStore::new();
        store.set("login_bridge_b", "2").await?;
        store.set("login_bridge_a", "1").await?;
        store.set("other_c", "3").await?;

        let entries = store.scan_prefix("login_bridge_").await?;
        assert_eq!(
            entries,
            vec![
                ("login_bridge_a".to_string(), "1".to_string()),
                ("login_bridge_b".to_string(), "2".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_take_yields_single_winner() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set("k", "v").await?;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.take("k").await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await??.is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }

    #[tokio::test]
    async fn sessions_are_recorded() -> Result<()> {
        let store = MemoryStore::new();
        store.insert_session(7, &[1, 2, 3], 60).await?;
        assert_eq!(
            store.sessions().await,
            vec![MemorySession {
                account_id: 7,
                token_hash: vec![1, 2, 3],
                ttl_seconds: 60,
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_account_is_none() -> Result<()> {
        let store = MemoryStore::new();
        store
            .insert_account(Account {
                id: 7,
                username: "admin".to_string(),
            })
            .await;
        assert!(store.find_account_by_id(7).await?.is_some());
        assert!(store.find_account_by_id(8).await?.is_none());
        Ok(())
    }
}
