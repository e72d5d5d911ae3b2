//! `PostgreSQL` backend.
//!
//! Token records live in `login_options` (name/value pairs), accounts in
//! `accounts`, sessions in `account_sessions`. See `db/sql/01_login_bridge.sql`.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};

use super::{Account, AccountDirectory, KeyValueStore, SessionStore, StoreFuture};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a small connection pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

impl KeyValueStore for PgStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let query = "SELECT value FROM login_options WHERE name = $1";
            let row = sqlx::query(query)
                .bind(key)
                .fetch_optional(&self.pool)
                .instrument(query_span("SELECT", query))
                .await
                .context("failed to read login option")?;
            anyhow::Ok(row.map(|row| row.get::<String, _>("value")))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let query = r"
                INSERT INTO login_options (name, value)
                VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ";
            sqlx::query(query)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .instrument(query_span("INSERT", query))
                .await
                .context("failed to write login option")?;
            anyhow::Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let query = "DELETE FROM login_options WHERE name = $1";
            let result = sqlx::query(query)
                .bind(key)
                .execute(&self.pool)
                .instrument(query_span("DELETE", query))
                .await
                .context("failed to delete login option")?;
            anyhow::Ok(result.rows_affected() > 0)
        })
    }

    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            // Row locking makes concurrent deletes of one name return at most one row.
            let query = "DELETE FROM login_options WHERE name = $1 RETURNING value";
            let row = sqlx::query(query)
                .bind(key)
                .fetch_optional(&self.pool)
                .instrument(query_span("DELETE", query))
                .await
                .context("failed to take login option")?;
            anyhow::Ok(row.map(|row| row.get::<String, _>("value")))
        })
    }

    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<(String, String)>> {
        Box::pin(async move {
            // `left()` instead of LIKE: namespace prefixes contain `_`.
            let query = r"
                SELECT name, value
                FROM login_options
                WHERE left(name, length($1)) = $1
                ORDER BY name
            ";
            let rows = sqlx::query(query)
                .bind(prefix)
                .fetch_all(&self.pool)
                .instrument(query_span("SELECT", query))
                .await
                .context("failed to scan login options")?;
            let entries: Vec<(String, String)> = rows
                .into_iter()
                .map(|row| (row.get("name"), row.get("value")))
                .collect();
            anyhow::Ok(entries)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self
                .pool
                .acquire()
                .instrument(acquire_span)
                .await
                .context("failed to acquire database connection")?;
            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping()
                .instrument(ping_span)
                .await
                .context("failed to ping database")?;
            anyhow::Ok(())
        })
    }
}

impl AccountDirectory for PgStore {
    fn find_account_by_id(&self, id: i64) -> StoreFuture<'_, Option<Account>> {
        Box::pin(async move {
            let query = r"
                SELECT id, username
                FROM accounts
                WHERE id = $1
                  AND status = 'active'
                LIMIT 1
            ";
            let row = sqlx::query(query)
                .bind(id)
                .fetch_optional(&self.pool)
                .instrument(query_span("SELECT", query))
                .await
                .context("failed to lookup account")?;
            anyhow::Ok(row.map(|row| Account {
                id: row.get("id"),
                username: row.get("username"),
            }))
        })
    }
}

impl SessionStore for PgStore {
    fn insert_session<'a>(
        &'a self,
        account_id: i64,
        token_hash: &'a [u8],
        ttl_seconds: i64,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let query = r"
                INSERT INTO account_sessions (account_id, session_hash, expires_at)
                VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
            ";
            sqlx::query(query)
                .bind(account_id)
                .bind(token_hash)
                .bind(ttl_seconds)
                .execute(&self.pool)
                .instrument(query_span("INSERT", query))
                .await
                .context("failed to insert session")?;
            anyhow::Ok(())
        })
    }
}
