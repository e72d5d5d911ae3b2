use crate::bridge::{BridgeService, IssueError, IssuedToken};
use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{error, instrument, warn};
use utoipa::ToSchema;

/// Shared secret required to issue login tokens over HTTP.
#[derive(Clone, Debug)]
pub struct IssuerSecret(SecretString);

impl IssuerSecret {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self(secret)
    }

    fn matches(&self, presented: &str) -> bool {
        self.0
            .expose_secret()
            .as_bytes()
            .ct_eq(presented.as_bytes())
            .into()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IssueRequest {
    pub uid: i64,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
}

#[utoipa::path(
    post,
    path= "/v1/login-tokens",
    request_body = IssueRequest,
    responses (
        (status = 201, description = "Login token issued", body = IssuedToken, content_type = "application/json"),
        (status = 400, description = "Missing payload or invalid TTL"),
        (status = 401, description = "Missing or wrong issuer secret"),
        (status = 404, description = "Account does not exist"),
    ),
    tag= "tokens"
)]
#[instrument(skip_all)]
pub async fn issue_login_token(
    headers: HeaderMap,
    service: Extension<Arc<BridgeService>>,
    secret: Extension<IssuerSecret>,
    payload: Option<Json<IssueRequest>>,
) -> Response {
    if !bearer_token(&headers).is_some_and(|token| secret.matches(token)) {
        warn!("Rejected login token request with missing or wrong secret");
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    }

    let request: IssueRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.issue_token(request.uid, request.ttl_seconds).await {
        Ok(issued) => (StatusCode::CREATED, Json(issued)).into_response(),
        Err(IssueError::InvalidTtl(_)) => {
            (StatusCode::BAD_REQUEST, "Invalid ttl_seconds".to_string()).into_response()
        }
        Err(IssueError::UnknownAccount(_)) => {
            (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response()
        }
        Err(err @ IssueError::Backend(_)) => {
            error!("Error issuing login token: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error issuing login token".to_string(),
            )
                .into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(bearer_token(&headers), Some("s3cret"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer s3cret"));
        assert_eq!(bearer_token(&headers), Some("s3cret"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic s3cret"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn issuer_secret_compares_exactly() {
        let secret = IssuerSecret::new(SecretString::from("s3cret".to_string()));
        assert!(secret.matches("s3cret"));
        assert!(!secret.matches("s3cre"));
        assert!(!secret.matches("s3cret!"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn ttl_is_optional() -> serde_json::Result<()> {
        let request: IssueRequest = serde_json::from_str(r#"{"uid":7}"#)?;
        assert_eq!(request.uid, 7);
        assert_eq!(request.ttl_seconds, None);
        Ok(())
    }
}
