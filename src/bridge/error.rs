//! Login and issuance failure reasons.
//!
//! These are logged, never returned to the requester.

use std::fmt;
use thiserror::Error;

/// Which field check rejected an otherwise well-formed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EndpointMismatch,
    KeyMismatch,
    Expired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndpointMismatch => f.write_str("endpoint mismatch"),
            Self::KeyMismatch => f.write_str("key mismatch"),
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// What is wrong with a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordDefect {
    #[error("not valid JSON")]
    InvalidJson,

    #[error("not a JSON object")]
    NotAnObject,

    #[error("missing {field}")]
    Missing { field: &'static str },

    #[error("{field} is not {expected}")]
    Mistyped {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("request path does not carry an endpoint and key")]
    MalformedPath,

    #[error("no login token stored for endpoint")]
    TokenNotFound,

    #[error("stored login token is malformed: {0}")]
    MalformedRecord(RecordDefect),

    #[error("login token rejected: {0}")]
    FieldMismatchOrExpired(Rejection),

    #[error("login token references unknown account {0}")]
    UnknownAccount(i64),

    #[error("login backend failure")]
    Backend(#[source] anyhow::Error),
}

impl LoginError {
    /// Short label for the `reason` log field.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedPath => "malformed_path",
            Self::TokenNotFound => "token_not_found",
            Self::MalformedRecord(_) => "malformed_record",
            Self::FieldMismatchOrExpired(Rejection::EndpointMismatch) => "endpoint_mismatch",
            Self::FieldMismatchOrExpired(Rejection::KeyMismatch) => "key_mismatch",
            Self::FieldMismatchOrExpired(Rejection::Expired) => "expired",
            Self::UnknownAccount(_) => "unknown_account",
            Self::Backend(_) => "backend",
        }
    }
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("account {0} does not exist")]
    UnknownAccount(i64),

    #[error("token TTL must be positive, got {0}")]
    InvalidTtl(i64),

    #[error("token issuance failed")]
    Backend(#[source] anyhow::Error),
}
