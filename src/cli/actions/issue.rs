use crate::{
    bridge::{BridgeConfig, BridgeService},
    store::PgStore,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub bridge: BridgeConfig,
    pub uid: i64,
    pub ttl_seconds: Option<i64>,
}

/// Issue a login link against the configured database and print it on stdout.
/// # Errors
/// Returns an error if the configuration is invalid, the account does not exist, or storage fails.
pub async fn execute(args: Args) -> Result<()> {
    args.bridge
        .validate()
        .context("Invalid login bridge configuration")?;

    let store = Arc::new(PgStore::connect(&args.dsn).await?);
    let service = BridgeService::new(args.bridge, store.clone(), store.clone(), store);

    let issued = service
        .issue_token(args.uid, args.ttl_seconds)
        .await
        .with_context(|| format!("Failed to issue login link for account {}", args.uid))?;

    debug!(endpoint = %issued.endpoint, expiry = issued.expiry, "login link issued");
    println!("{}", issued.url);

    Ok(())
}
