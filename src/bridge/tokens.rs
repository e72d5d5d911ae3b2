//! Namespaced view of the key-value store holding token records.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::record::TokenRecord;
use crate::store::KeyValueStore;

#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.namespace)
    }

    /// Remove the raw record for `endpoint`, returning it if it was present.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn take(&self, endpoint: &str) -> Result<Option<String>> {
        self.backend.take(&self.key(endpoint)).await
    }

    /// # Errors
    /// Returns an error if the record cannot be serialized or stored.
    pub async fn put(&self, record: &TokenRecord) -> Result<()> {
        let stored = record
            .to_stored()
            .context("failed to serialize login token")?;
        self.backend.set(&self.key(&record.endpoint), &stored).await
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn delete(&self, endpoint: &str) -> Result<bool> {
        self.backend.delete(&self.key(endpoint)).await
    }

    /// Every record in the namespace as `(endpoint, raw value)`.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn scan(&self) -> Result<Vec<(String, String)>> {
        let entries = self.backend.scan_prefix(&self.namespace).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&self.namespace)
                    .map(|endpoint| (endpoint.to_string(), value))
            })
            .collect())
    }

    /// # Errors
    /// Returns an error if the backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
