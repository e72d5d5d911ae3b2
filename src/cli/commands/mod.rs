pub mod bridge;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_ISSUER_SECRET: &str = "issuer-secret";

pub const CMD_ISSUE: &str = "issue";
pub const ARG_UID: &str = "uid";
pub const ARG_TTL_SECONDS: &str = "ttl-seconds";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("login-bridge")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("LOGIN_BRIDGE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .env("LOGIN_BRIDGE_DSN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_ISSUER_SECRET)
                .long(ARG_ISSUER_SECRET)
                .help("Bearer secret for POST /v1/login-tokens; the route is disabled when unset")
                .env("LOGIN_BRIDGE_ISSUER_SECRET")
                .hide_env_values(true),
        )
        .subcommand(issue_command());

    let command = bridge::with_args(command);
    logging::with_args(command)
}

fn issue_command() -> Command {
    Command::new(CMD_ISSUE)
        .about("Issue a one-time login link and print it")
        .arg(
            Arg::new(ARG_UID)
                .long(ARG_UID)
                .help("Account id the link logs into")
                .required(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TTL_SECONDS)
                .long(ARG_TTL_SECONDS)
                .help("Link lifetime in seconds (default: --token-ttl-seconds)")
                .value_parser(clap::value_parser!(i64)),
        )
}
