//! Error types for the Netcraft client.

use crate::api_error::ApiError;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

/// Errors that can occur when using the Netcraft client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP client could not be set up.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An argument was rejected before any request was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value could not be mapped to or from its wire token.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The API answered, but the exchange failed.
    #[error(transparent)]
    Failure(Box<ClientFailure>),
}

impl Error {
    /// The request failure, if this error came from an API exchange.
    pub fn failure(&self) -> Option<&ClientFailure> {
        match self {
            Error::Failure(failure) => Some(&**failure),
            _ => None,
        }
    }
}

impl From<ClientFailure> for Error {
    fn from(failure: ClientFailure) -> Self {
        Error::Failure(Box::new(failure))
    }
}

/// How an API exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The exchange broke off: connection, timeout or body read.
    Transport,
    /// Rejected status with a body that is empty or not JSON.
    Status,
    /// A JSON body that does not match the expected shape.
    Decode,
    /// Rejected status with a well-formed error envelope.
    Api,
    /// Accepted status, but the body failed a post-condition.
    ContractViolation,
}

/// A failed API exchange, with enough context to tell what failed
/// without going back to the transport.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ClientFailure {
    pub(crate) kind: FailureKind,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) status: Option<StatusCode>,
    pub(crate) errors: Vec<ApiError>,
    pub(crate) message: String,
    #[source]
    pub(crate) source: Option<Arc<reqwest::Error>>,
}

impl ClientFailure {
    pub(crate) fn new(
        kind: FailureKind,
        method: Method,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            method,
            path: path.into(),
            status: None,
            errors: Vec::new(),
            message: message.into(),
            source: None,
        }
    }

    /// A request that never produced a complete response.
    pub(crate) fn transport(method: Method, path: impl Into<String>, err: reqwest::Error) -> Self {
        let path = path.into();
        let message = format!("Failed to request {method} {path}: {err}");
        let mut failure = Self::new(FailureKind::Transport, method, path, message);
        failure.status = err.status();
        failure.source = Some(Arc::new(err));
        failure
    }

    pub(crate) fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn with_errors(mut self, errors: Vec<ApiError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The HTTP method of the failed request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path of the failed request, relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The response status, when a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Structured errors parsed from the response body. Empty when none
    /// could be parsed.
    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised by the wire codecs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The member has no wire token in its enum family.
    #[error("no {family} wire token for `{name}`")]
    UnmappedEnum { family: &'static str, name: String },

    /// The wire token matches no member of the enum.
    #[error("unknown {family} token `{token}`")]
    UnknownToken { family: &'static str, token: String },

    /// The token cannot be read as a boolean.
    #[error("invalid boolean token: {0}")]
    InvalidBool(String),

    /// The token cannot be read as a unix timestamp.
    #[error("invalid unix timestamp token: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_accessor() {
        let err: Error = ClientFailure::new(
            FailureKind::Status,
            Method::GET,
            "stats/leaderboard",
            "boom",
        )
        .with_status(StatusCode::BAD_GATEWAY)
        .into();

        let failure = err.failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::Status);
        assert_eq!(*failure.method(), Method::GET);
        assert_eq!(failure.path(), "stats/leaderboard");
        assert_eq!(failure.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(failure.errors().is_empty());
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_source() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err();

        let failure = ClientFailure::transport(Method::GET, "stats/leaderboard", err);

        assert_eq!(failure.kind(), FailureKind::Transport);
        assert_eq!(failure.path(), "stats/leaderboard");
        assert!(failure.message().starts_with("Failed to request GET stats/leaderboard"));
        assert!(std::error::Error::source(&failure).is_some());
    }

    #[test]
    fn test_non_failure_has_no_failure() {
        let err = Error::Config("bad".into());
        assert!(err.failure().is_none());
    }
}
