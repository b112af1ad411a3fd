//! Error types shared by the router and the client.
//!
//! Request side failures on the server never show up here: they are resolved
//! into a terminal [`WireResponse`](crate::WireResponse) before a handler runs.
//! The types below describe what can go wrong while *building* a request
//! ([`EncodeError`]), while *moving* it ([`TransportError`]) and while
//! *interpreting* the answer ([`DecodeError`]).

use bytes::Bytes;
use http::StatusCode;
use std::error::Error;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Type-erased error used for body streams and codec failures.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Failure while turning a typed value into a wire request, or into a url.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("can't encode url: {reason}")]
    Url { reason: String },

    #[error("can't encode header: {reason}")]
    Header { reason: String },

    #[error("can't encode body: {source}")]
    Body { source: BoxError },

    #[error("invalid uri: {source}")]
    InvalidUri {
        #[from]
        source: http::uri::InvalidUri,
    },
}

impl EncodeError {
    pub fn url<S: ToString>(str: S) -> Self {
        Self::Url { reason: str.to_string() }
    }

    pub fn header<S: ToString>(str: S) -> Self {
        Self::Header { reason: str.to_string() }
    }

    pub fn body<E: Into<BoxError>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }
}

/// The transport could not complete the round trip.
///
/// A caller may retry on these, they say nothing about the endpoint itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect error: {source}")]
    Connect { source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("unsupported uri: {reason}")]
    InvalidUri { reason: String },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("response size exceed the limit {max_size}")]
    ResponseTooLarge { max_size: usize },

    #[error("body error: {source}")]
    Body { source: BoxError },
}

impl TransportError {
    pub fn connect(e: io::Error) -> Self {
        Self::Connect { source: e }
    }

    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }

    pub fn invalid_response<S: ToString>(str: S) -> Self {
        Self::InvalidResponse { reason: str.to_string() }
    }

    pub fn body<E: Into<BoxError>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }
}

/// A response arrived but could not be interpreted as the endpoint's response type.
///
/// The raw status and body are kept so callers can log or inspect them.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected response status {status}")]
    UnexpectedStatus { status: StatusCode, body: Bytes },

    #[error("malformed response body: {source}")]
    Malformed { status: StatusCode, body: Bytes, source: BoxError },
}

impl DecodeError {
    pub fn unexpected_status(status: StatusCode, body: Bytes) -> Self {
        Self::UnexpectedStatus { status, body }
    }

    pub fn malformed<E: Into<BoxError>>(status: StatusCode, body: Bytes, e: E) -> Self {
        Self::Malformed { status, body, source: e.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnexpectedStatus { status, .. } | Self::Malformed { status, .. } => *status,
        }
    }

    pub fn body(&self) -> &Bytes {
        match self {
            Self::UnexpectedStatus { body, .. } | Self::Malformed { body, .. } => body,
        }
    }
}

/// Terminal failure of [`Client::issue`](crate::client::Client::issue).
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("request error: {source}")]
    Encode {
        #[from]
        source: EncodeError,
    },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

/// An url pattern was rejected while building an endpoint description.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {reason}")]
    Invalid { pattern: String, reason: String },
}

impl PatternError {
    pub fn invalid<S: ToString>(pattern: &str, reason: S) -> Self {
        Self::Invalid { pattern: pattern.to_string(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_keeps_raw_parts() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = DecodeError::malformed(StatusCode::OK, Bytes::from_static(b"nope"), source);

        assert_eq!(err.status(), StatusCode::OK);
        assert_eq!(err.body().as_ref(), b"nope");
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("malformed response body"));
    }

    #[test]
    fn issue_error_from_transport() {
        let err: IssueError = TransportError::timeout(Duration::from_millis(5)).into();
        assert!(matches!(err, IssueError::Transport { source: TransportError::Timeout { .. } }));
    }
}
