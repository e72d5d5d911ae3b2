//! # Login Bridge (one-time login links)
//!
//! `login-bridge` turns a short-lived link of the shape
//! `/<marker>/<endpoint>/<key>` into an authenticated session for a stored
//! account, then redirects the browser to the landing page.
//!
//! ## Token lifecycle
//!
//! - **Issue:** an operator (HTTP or CLI) asks for a link for an account id.
//!   A random `endpoint` and `key` are generated and stored with an expiry
//!   under `<namespace><endpoint>`.
//! - **Consume:** the first request that reaches the store takes the record
//!   out of it. Every later outcome (wrong key, expired, unknown account,
//!   success) leaves the store without that record.
//! - **Sweep:** links that were never visited are removed once expired.
//!
//! ## Failure handling
//!
//! Every invalid link produces the same redirect to the login page. The
//! reason is logged with a `reason` field but never shown to the requester,
//! so a requester cannot tell "unknown" from "expired" from "wrong key".

pub mod api;
pub mod bridge;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{ensure, Context, Result};
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    // Normalize SQL to avoid brittle formatting checks in schema tests.
    fn canonicalize_sql(sql: &str) -> String {
        sql.chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| ch.to_ascii_lowercase())
            .collect()
    }

    fn canonical_sql(path: &Path) -> Result<String> {
        let sql = fs::read_to_string(path)
            .with_context(|| format!("Failed to read SQL file at {}", path.display()))?;
        Ok(canonicalize_sql(&sql))
    }

    fn assert_contains(path: &Path, canonical: &str, needle: &str) -> Result<()> {
        ensure!(
            canonical.contains(needle),
            "Expected {needle} is missing in {}",
            path.display()
        );
        Ok(())
    }

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn schema_sql_integrity() -> Result<()> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("db/sql/01_login_bridge.sql");
        let canonical = canonical_sql(&path)?;
        // Token records are looked up and taken by exact name.
        assert_contains(&path, &canonical, "nametextprimarykey")?;
        assert_contains(&path, &canonical, "valuetextnotnull")?;
        // Only active accounts may log in.
        assert_contains(&path, &canonical, "statustextnotnulldefault'active'")?;
        assert_contains(&path, &canonical, "check(statusin('active','disabled'))")?;
        // Sessions are stored by hash and go away with their account.
        assert_contains(&path, &canonical, "session_hashbyteanotnullunique")?;
        assert_contains(&path, &canonical, "referencesaccounts(id)ondeletecascade")?;
        assert_contains(&path, &canonical, "expires_attimestamptznotnull")
    }

    #[test]
    fn schema_sql_is_rerunnable() -> Result<()> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("db/sql/01_login_bridge.sql");
        let sql = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read SQL file at {}", path.display()))?;
        for line in sql.lines().map(str::trim) {
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("CREATE TABLE") || upper.starts_with("CREATE INDEX") {
                ensure!(
                    upper.contains("IF NOT EXISTS"),
                    "Statement is not idempotent: {line}"
                );
            }
        }
        Ok(())
    }
}
