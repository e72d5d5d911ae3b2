//! One-time login links.
//!
//! Flow summary:
//! - A request path carrying the marker segment is split into `endpoint` and `key`.
//! - The record stored under `<namespace><endpoint>` is taken out of the store.
//! - The record is checked (shape, endpoint, key, expiry) and the account resolved.
//! - A persistent session is created and the caller is redirected.
//!
//! Any failure yields [`LoginOutcome::Invalid`]; the reason only reaches the logs.

mod config;
mod error;
mod issuer;
mod path;
mod record;
mod service;
mod session;
mod sweeper;
mod tokens;

pub use config::BridgeConfig;
pub use error::{IssueError, LoginError, RecordDefect, Rejection};
pub use issuer::IssuedToken;
pub use path::{check_interceptable, has_marker, parse_bridge_path, BridgePath, Passthrough};
pub use record::TokenRecord;
pub use service::{BridgeService, LoginOutcome, LoginSuccess};
pub use session::{session_cookie, IssuedSession, SessionIssuer, SESSION_COOKIE_NAME};
pub use sweeper::{spawn_sweeper, SweepReport};
pub use tokens::TokenStore;
