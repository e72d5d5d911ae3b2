//! Login link path parsing and interception rules.

use axum::http::{HeaderMap, Method};

use super::error::LoginError;

/// Endpoint and public key carried by a login link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePath<'a> {
    pub endpoint: &'a str,
    pub public_key: &'a str,
}

/// Whether any segment of `path` is exactly `marker`.
#[must_use]
pub fn has_marker(path: &str, marker: &str) -> bool {
    path.split('/').any(|segment| segment == marker)
}

/// Split `<...>/<marker>/<endpoint>/<key>` into its last two segments.
///
/// The marker must be followed by at least two segments and the path must
/// hold at least three non-empty segments.
///
/// # Errors
/// Returns [`LoginError::MalformedPath`] when the shape does not match.
pub fn parse_bridge_path<'a>(path: &'a str, marker: &str) -> Result<BridgePath<'a>, LoginError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let marker_index = segments
        .iter()
        .position(|segment| *segment == marker)
        .ok_or(LoginError::MalformedPath)?;

    if segments.len() < 3 || segments.len() < marker_index + 3 {
        return Err(LoginError::MalformedPath);
    }

    let count = segments.len();
    Ok(BridgePath {
        endpoint: segments[count - 2],
        public_key: segments[count - 1],
    })
}

/// Why a request on a marker path is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    /// Only GET may consume a token.
    Method,
    /// XHR and prefetch requests are not user navigations.
    Background,
}

/// Decide whether a request may run the login chain.
///
/// # Errors
/// Returns the [`Passthrough`] reason when the request must not touch the store.
pub fn check_interceptable(method: &Method, headers: &HeaderMap) -> Result<(), Passthrough> {
    if method != Method::GET {
        return Err(Passthrough::Method);
    }
    if headers.contains_key("x-requested-with") {
        return Err(Passthrough::Background);
    }
    let prefetch = ["purpose", "sec-purpose", "x-purpose", "x-moz"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("prefetch"));
    if prefetch {
        return Err(Passthrough::Background);
    }
    Ok(())
}
