//! Periodic removal of login tokens that were never visited.

use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::{record::TokenRecord, service::unix_now, BridgeService};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
}

impl BridgeService {
    /// # Errors
    /// Returns an error if the store cannot be scanned or a record cannot be removed.
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        self.sweep_expired_at(unix_now()).await
    }

    /// Remove every record in the namespace that is malformed or expired at `now`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be scanned or a record cannot be removed.
    pub async fn sweep_expired_at(&self, now: i64) -> Result<SweepReport> {
        let entries = self.tokens().scan().await?;
        let mut report = SweepReport {
            scanned: entries.len(),
            removed: 0,
        };

        for (endpoint, raw) in entries {
            let stale = TokenRecord::parse(&raw).map_or(true, |record| record.is_expired_at(now));
            if stale && self.tokens().delete(&endpoint).await? {
                report.removed += 1;
            }
        }

        Ok(report)
    }
}

/// Spawn a background task that sweeps the token namespace every `interval`.
pub fn spawn_sweeper(
    service: Arc<BridgeService>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;

            match service.sweep_expired().await {
                Ok(report) if report.removed > 0 => {
                    info!(
                        scanned = report.scanned,
                        removed = report.removed,
                        "expired login tokens removed"
                    );
                }
                Ok(report) => debug!(scanned = report.scanned, "no expired login tokens"),
                Err(err) => error!("login token sweep failed: {err:#}"),
            }
        }
    })
}
