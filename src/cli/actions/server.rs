use crate::{
    api,
    bridge::{spawn_sweeper, BridgeConfig, BridgeService},
    cli::telemetry,
    store::PgStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub bridge: BridgeConfig,
    pub issuer_secret: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid, the database is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    args.bridge
        .validate()
        .context("Invalid login bridge configuration")?;
    log_startup_args(&args);

    let store = Arc::new(PgStore::connect(&args.dsn).await?);
    let service = Arc::new(BridgeService::new(
        args.bridge,
        store.clone(),
        store.clone(),
        store,
    ));

    let sweep_interval = service.config().sweep_interval_seconds();
    let sweeper = (sweep_interval > 0)
        .then(|| spawn_sweeper(service.clone(), Duration::from_secs(sweep_interval)));

    let app = api::router(service, args.issuer_secret);
    let result = api::new(args.port, app).await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let config = &args.bridge;
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("public_url", config.public_url().to_string()),
        ("marker", config.marker().to_string()),
        ("namespace", config.namespace().to_string()),
        ("login_url", config.login_url().to_string()),
        ("landing_url", config.landing_url().to_string()),
        ("token_ttl_seconds", config.token_ttl_seconds().to_string()),
        ("session_ttl_seconds", config.session_ttl_seconds().to_string()),
        (
            "sweep_interval_seconds",
            config.sweep_interval_seconds().to_string(),
        ),
        ("issuer_route", args.issuer_secret.is_some().to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

pub(crate) fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
