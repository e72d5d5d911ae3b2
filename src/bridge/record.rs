//! Stored token record.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{LoginError, RecordDefect};

/// One login token as stored under `<namespace><endpoint>`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub endpoint: String,
    pub key: String,
    pub uid: i64,
    pub expiry: i64,
}

impl TokenRecord {
    /// Parse a stored JSON value.
    ///
    /// `uid` and `expiry` may be numbers or numeric strings. Empty strings,
    /// zero and non-positive numbers count as missing.
    ///
    /// # Errors
    /// Returns [`LoginError::MalformedRecord`] for anything that is not a JSON
    /// object with the four fields present.
    pub fn parse(raw: &str) -> Result<Self, LoginError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|_| LoginError::MalformedRecord(RecordDefect::InvalidJson))?;
        let Value::Object(fields) = value else {
            return Err(LoginError::MalformedRecord(RecordDefect::NotAnObject));
        };

        Ok(Self {
            endpoint: required_text(&fields, "endpoint")?,
            key: required_text(&fields, "key")?,
            uid: required_positive(&fields, "uid")?,
            expiry: required_positive(&fields, "expiry")?,
        })
    }

    /// Serialize for storage.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_stored(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Valid through the `expiry` second itself.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expiry
    }
}

fn missing(field: &'static str) -> LoginError {
    LoginError::MalformedRecord(RecordDefect::Missing { field })
}

fn mistyped(field: &'static str, expected: &'static str) -> LoginError {
    LoginError::MalformedRecord(RecordDefect::Mistyped { field, expected })
}

fn required_text(fields: &Map<String, Value>, field: &'static str) -> Result<String, LoginError> {
    match fields.get(field) {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        Some(Value::String(_) | Value::Null) | None => Err(missing(field)),
        Some(_) => Err(mistyped(field, "a string")),
    }
}

fn required_positive(fields: &Map<String, Value>, field: &'static str) -> Result<i64, LoginError> {
    let parsed = match fields.get(field) {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        Some(Value::Null) | None => return Err(missing(field)),
        Some(_) => None,
    };
    match parsed {
        Some(value) if value > 0 => Ok(value),
        Some(_) => Err(missing(field)),
        None => Err(mistyped(field, "an integer")),
    }
}
