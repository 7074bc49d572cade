//! Error types for the Reader API client.
//!
//! # Design
//! Every failing call produces exactly one `Error`, and the variant tells the
//! caller which side of the wire failed:
//!
//! - `Client`: bad input caught before any request was sent.
//! - `Api`: the service answered with a non-success status.
//! - `Transport` / `Decode`: the round trip itself failed, or a success
//!   response carried a body we could not read.
//! - `Cancelled` / `DeadlineExceeded`: the caller's `CallContext` stopped
//!   the call.
//!
//! Callers pick a retry policy from `is_local` / `is_remote` /
//! `is_transport` / `is_cancelled` rather than from message text.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Tag carried by a local validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    InvalidRequest,
    InvalidParameter,
    InvalidToken,
}

impl ClientErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientErrorKind::InvalidRequest => "invalid_request",
            ClientErrorKind::InvalidParameter => "invalid_parameter",
            ClientErrorKind::InvalidToken => "invalid_token",
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-success response from the service.
///
/// `details` holds the decoded error body verbatim when it was a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

/// Body keys the service uses for a human-readable message, in lookup order.
const MESSAGE_KEYS: [&str; 3] = ["message", "detail", "error"];

impl ApiError {
    /// Classify a non-success response.
    ///
    /// A body that is not a JSON object still yields an `ApiError`; only the
    /// message is synthesized from the status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        let Ok(details) = serde_json::from_str::<HashMap<String, Value>>(body) else {
            return Self {
                status,
                message: unexpected_status(status),
                details: None,
            };
        };

        let message = MESSAGE_KEYS
            .iter()
            .find_map(|key| details.get(*key).and_then(Value::as_str))
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| unexpected_status(status));

        Self {
            status,
            message,
            details: Some(details),
        }
    }
}

fn unexpected_status(status: u16) -> String {
    format!("unexpected status code: {status}")
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error (status {}): {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Errors returned by every client operation and by the webhook decoder.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input, rejected before any network call.
    #[error("{kind}: {message}")]
    Client {
        kind: ClientErrorKind,
        message: String,
    },

    /// The service returned an unexpected status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request could not be sent or the response could not be read.
    #[error("failed to execute request: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A JSON document did not have the expected shape.
    #[error("failed to decode JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// The call's cancel token fired before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The call's deadline passed before a response arrived.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::Client {
            kind: ClientErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Error::Client {
            kind: ClientErrorKind::InvalidParameter,
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Error::Client {
            kind: ClientErrorKind::InvalidToken,
            message: message.into(),
        }
    }

    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(source.into())
    }

    /// Raised before the request left the process.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Client { .. })
    }

    /// The service answered with a non-success status.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Api(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Decode(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_becomes_message() {
        let err = ApiError::from_response(500, r#"{"error": "internal server error"}"#);
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "internal server error");
        let details = err.details.unwrap();
        assert_eq!(details["error"], "internal server error");
    }

    #[test]
    fn message_field_takes_precedence() {
        let err = ApiError::from_response(
            400,
            r#"{"message": "bad url", "detail": "ignored", "url": ["Enter a valid URL."]}"#,
        );
        assert_eq!(err.message, "bad url");
        assert_eq!(err.details.unwrap().len(), 3);
    }

    #[test]
    fn detail_field_is_used_for_auth_failures() {
        let err = ApiError::from_response(401, r#"{"detail": "Invalid token."}"#);
        assert_eq!(err.message, "Invalid token.");
    }

    #[test]
    fn object_without_message_gets_synthesized_message() {
        let err = ApiError::from_response(400, r#"{"tags": ["not a list"]}"#);
        assert_eq!(err.message, "unexpected status code: 400");
        assert!(err.details.is_some());
    }

    #[test]
    fn non_json_body_still_yields_api_error() {
        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.status, 502);
        assert_eq!(err.message, "unexpected status code: 502");
        assert!(err.details.is_none());
    }

    #[test]
    fn empty_body_still_yields_api_error() {
        let err = ApiError::from_response(404, "");
        assert_eq!(err.message, "unexpected status code: 404");
        assert!(err.details.is_none());
    }

    #[test]
    fn json_array_body_is_not_an_error_shape() {
        let err = ApiError::from_response(400, r#"["nope"]"#);
        assert!(err.details.is_none());
    }

    #[test]
    fn display_formats() {
        let err = Error::invalid_request("URL is required");
        assert_eq!(err.to_string(), "invalid_request: URL is required");

        let err = Error::from(ApiError::from_response(500, r#"{"error":"boom"}"#));
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::invalid_parameter("x").is_local());
        let api = Error::from(ApiError::from_response(503, ""));
        assert!(api.is_remote());
        assert_eq!(api.status(), Some(503));
        assert!(Error::transport("connection refused").is_transport());
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::DeadlineExceeded.is_cancelled());
        assert!(!Error::DeadlineExceeded.is_remote());
    }
}
