//! Storage seams used by the bridge.
//!
//! Three collaborators are injected into [`crate::bridge::BridgeService`]:
//!
//! - [`KeyValueStore`]: an untyped option table holding token records.
//! - [`AccountDirectory`]: resolves account ids to accounts.
//! - [`SessionStore`]: persists hashed session tokens.
//!
//! [`MemoryStore`] implements all three for tests and local runs;
//! [`PgStore`] implements them on `PostgreSQL`.

mod memory;
mod postgres;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::PgStore;

use anyhow::Result;
use serde::Serialize;
use std::{future::Future, pin::Pin};
use utoipa::ToSchema;

/// Boxed future returned by the storage traits.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Generic string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Insert or replace `key`.
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

    /// Remove `key`, returning whether it was present.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

    /// Remove `key` and return its value in one atomic step.
    ///
    /// Of several concurrent callers for the same key, at most one gets `Some`.
    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// All entries whose key starts with `prefix`.
    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<(String, String)>>;

    fn ping(&self) -> StoreFuture<'_, ()>;
}

/// Account a login token may authenticate as.
#[derive(ToSchema, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
}

pub trait AccountDirectory: Send + Sync {
    /// Look up an active account.
    fn find_account_by_id(&self, id: i64) -> StoreFuture<'_, Option<Account>>;
}

pub trait SessionStore: Send + Sync {
    /// Persist a session by the hash of its token.
    fn insert_session<'a>(
        &'a self,
        account_id: i64,
        token_hash: &'a [u8],
        ttl_seconds: i64,
    ) -> StoreFuture<'a, ()>;
}
