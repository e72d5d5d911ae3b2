use clap::{Arg, Command};

pub const ARG_MARKER: &str = "marker";
pub const ARG_NAMESPACE: &str = "namespace";
pub const ARG_PUBLIC_URL: &str = "public-url";
pub const ARG_LOGIN_URL: &str = "login-url";
pub const ARG_LANDING_URL: &str = "landing-url";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SWEEP_INTERVAL_SECONDS: &str = "sweep-interval-seconds";

/// Login link settings, shared by the server and the `issue` subcommand.
#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_link_args(command);
    with_lifetime_args(command)
}

fn with_link_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MARKER)
                .long(ARG_MARKER)
                .help("Path segment that identifies a login link")
                .env("LOGIN_BRIDGE_MARKER")
                .default_value("login-bridge")
                .global(true),
        )
        .arg(
            Arg::new(ARG_NAMESPACE)
                .long(ARG_NAMESPACE)
                .help("Key prefix for stored login tokens")
                .env("LOGIN_BRIDGE_NAMESPACE")
                .default_value("login_bridge_")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PUBLIC_URL)
                .long(ARG_PUBLIC_URL)
                .help("Externally visible origin used to build login links")
                .env("LOGIN_BRIDGE_PUBLIC_URL")
                .default_value("http://localhost:8080")
                .global(true),
        )
        .arg(
            Arg::new(ARG_LOGIN_URL)
                .long(ARG_LOGIN_URL)
                .help("Redirect target for invalid login links")
                .env("LOGIN_BRIDGE_LOGIN_URL")
                .default_value("/login")
                .global(true),
        )
        .arg(
            Arg::new(ARG_LANDING_URL)
                .long(ARG_LANDING_URL)
                .help("Redirect target after a successful login")
                .env("LOGIN_BRIDGE_LANDING_URL")
                .default_value("/admin/")
                .global(true),
        )
}

fn with_lifetime_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Default login token TTL in seconds")
                .env("LOGIN_BRIDGE_TOKEN_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session TTL in seconds")
                .env("LOGIN_BRIDGE_SESSION_TTL_SECONDS")
                .default_value("1209600")
                .value_parser(clap::value_parser!(i64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_SWEEP_INTERVAL_SECONDS)
                .long(ARG_SWEEP_INTERVAL_SECONDS)
                .help("Interval between expired token sweeps in seconds, 0 disables")
                .env("LOGIN_BRIDGE_SWEEP_INTERVAL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
}
