//! Error types for the E-sheetbook API client.
//!
//! # Design
//! Every failure a caller can see is an `ApiError`. The four transport-level
//! outcomes (`Network`, `Timeout`, `DuplicateRequest`, `HttpStatus`) are what
//! the pipeline produces while talking to the server; the remaining variants
//! cover requests rejected before dispatch and bodies that do not match the
//! expected shape. `HttpStatus` keeps the parsed body so the UI can render the
//! server's message without touching transport internals.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpMethod;
use crate::retry::RetryPolicy;

/// Errors returned by the request pipeline and every endpoint wrapper.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response reached us (DNS, connect, reset, unreadable body).
    #[error("network error: {0}")]
    Network(String),

    /// No response arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// An identical request is still in flight.
    #[error("duplicate request: {method} {url} is already in flight")]
    DuplicateRequest { method: HttpMethod, url: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: Value },

    /// The request was malformed before dispatch (empty url, missing payload).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),

    /// The response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Decode(String),
}

/// Coarse classification of an `ApiError`, for callers that only branch on
/// the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    DuplicateRequest,
    HttpStatus,
    InvalidRequest,
    Encode,
    Decode,
}

impl ApiError {
    /// Build an `HttpStatus` error, parsing the body as JSON when possible.
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        let body = if raw_body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(raw_body).unwrap_or_else(|_| Value::String(raw_body.to_string()))
        };
        ApiError::HttpStatus { status, body }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::DuplicateRequest { .. } => ErrorKind::DuplicateRequest,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::Encode(_) => ErrorKind::Encode,
            ApiError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Status code for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's human-readable message, if the body carries one.
    ///
    /// The backend uses `msg` on most routes and `message` on website routes.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::HttpStatus { body, .. } => match body {
                Value::Object(map) => map
                    .get("msg")
                    .or_else(|| map.get("message"))
                    .and_then(Value::as_str),
                Value::String(s) if !s.is_empty() => Some(s.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether `policy` allows another attempt after this error.
    pub fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::HttpStatus { status, .. } => policy.retries_status(*status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_parses_json_body() {
        let err = ApiError::from_status(401, r#"{"msg":"Authentication Invalid"}"#);
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("Authentication Invalid"));
    }

    #[test]
    fn from_status_keeps_non_json_body_as_string() {
        let err = ApiError::from_status(502, "Bad Gateway");
        match &err {
            ApiError::HttpStatus { body, .. } => assert_eq!(body, "Bad Gateway"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.server_message(), Some("Bad Gateway"));
    }

    #[test]
    fn from_status_empty_body_is_null() {
        let err = ApiError::from_status(404, "");
        assert!(err.is_not_found());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn website_routes_use_message_field() {
        let err = ApiError::from_status(400, r#"{"message":"website not found"}"#);
        assert_eq!(err.server_message(), Some("website not found"));
    }

    #[test]
    fn retryable_classification() {
        let policy = RetryPolicy::default();
        assert!(ApiError::Network("reset".into()).is_retryable(&policy));
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_retryable(&policy));
        assert!(ApiError::from_status(503, "").is_retryable(&policy));
        assert!(!ApiError::from_status(401, "").is_retryable(&policy));
        assert!(!ApiError::Decode("bad".into()).is_retryable(&policy));
        assert!(!ApiError::DuplicateRequest {
            method: HttpMethod::Get,
            url: "http://x/file".into()
        }
        .is_retryable(&policy));
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ApiError::Timeout(Duration::ZERO).kind(), ErrorKind::Timeout);
        assert_eq!(ApiError::from_status(500, "").kind(), ErrorKind::HttpStatus);
        assert_eq!(ApiError::InvalidRequest("x".into()).kind(), ErrorKind::InvalidRequest);
    }
}
