use crate::bridge::{
    check_interceptable, has_marker, session_cookie, BridgeService, LoginOutcome, Passthrough,
};
use axum::{
    extract::Extension,
    http::{
        header::{ALLOW, CACHE_CONTROL, REFERRER_POLICY, SET_COOKIE},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Fallback handler: resolves login links and answers `404` for anything else.
///
/// Documented with the default marker; the served marker is configurable.
#[utoipa::path(
    get,
    path= "/login-bridge/{endpoint}/{key}",
    params(
        ("endpoint" = String, Path, description = "Token endpoint"),
        ("key" = String, Path, description = "Token public key"),
    ),
    responses (
        (status = 303, description = "Redirect to the landing page with a session cookie, or to the login page"),
        (status = 404, description = "Background request (XHR or prefetch)"),
        (status = 405, description = "Only GET consumes a login link"),
    ),
    tag= "login"
)]
pub async fn bridge(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Extension(service): Extension<Arc<BridgeService>>,
) -> Response {
    let path = uri.path();
    let config = service.config();

    if !has_marker(path, config.marker()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match check_interceptable(&method, &headers) {
        Ok(()) => {}
        Err(Passthrough::Method) => {
            debug!(%method, "login link requested with a non-GET method");
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(ALLOW, HeaderValue::from_static("GET"))],
            )
                .into_response();
        }
        Err(Passthrough::Background) => {
            debug!("login link requested by a background context");
            return StatusCode::NOT_FOUND.into_response();
        }
    }

    match service.resolve_and_login(path).await {
        LoginOutcome::Success(success) => match session_cookie(config, &success.session) {
            Ok(cookie) => redirect(config.landing_url(), Some(cookie)),
            Err(err) => {
                error!("Failed to build session cookie: {err}");
                redirect(config.login_url(), None)
            }
        },
        LoginOutcome::Invalid => redirect(config.login_url(), None),
    }
}

fn redirect(location: &str, cookie: Option<HeaderValue>) -> Response {
    let mut response = Redirect::to(location).into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if let Some(cookie) = cookie {
        headers.insert(SET_COOKIE, cookie);
    }
    response
}
