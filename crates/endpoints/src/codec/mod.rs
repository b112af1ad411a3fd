//! Body and response codecs.
//!
//! Three narrow traits, each used by one side only:
//!
//! - [`BodyCodec`]: the router decodes request bodies, the client encodes them,
//! - [`ResponseEncoder`]: the router turns handler results into responses,
//! - [`ResponseDecoder`]: the client turns responses back into values.
//!
//! A codec type implements whichever of them make sense for it; [`Json`] implements all three.

mod empty;
mod form;
mod json;
mod status;
mod text;

pub use empty::{Empty, empty};
pub use form::{Form, form};
pub use json::{Json, json};
pub use status::{OrNotFound, WithStatus, or_not_found, with_status};
pub use text::{Raw, Text, raw, text};

use crate::body::{CollectError, RequestBody, ResponseBody, WireResponse};
use crate::error::{DecodeError, EncodeError};
use crate::rejection::terminal;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use tracing::warn;

/// Body limit used by codecs unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[async_trait]
pub trait BodyCodec: Send + Sync {
    type Output: Send;

    /// Reads and decodes the body of a request that was already matched.
    ///
    /// A failure is a terminal response for that request.
    async fn decode_body(&self, body: RequestBody) -> Result<Self::Output, WireResponse>;

    fn encode_body(&self, value: Self::Output) -> Result<EncodedBody, EncodeError>;
}

pub trait ResponseEncoder: Send + Sync {
    type Value;

    fn encode_response(&self, value: Self::Value) -> WireResponse;
}

pub trait ResponseDecoder {
    type Value;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError>;
}

/// A request body ready to be sent, with its content type if it has one.
#[derive(Debug, Clone, Default)]
pub struct EncodedBody {
    content_type: Option<HeaderValue>,
    bytes: Bytes,
}

impl EncodedBody {
    pub fn new(content_type: Option<HeaderValue>, bytes: impl Into<Bytes>) -> Self {
        Self { content_type, bytes: bytes.into() }
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    pub fn into_parts(self) -> (Option<HeaderValue>, Bytes) {
        (self.content_type, self.bytes)
    }
}

pub(crate) async fn collect(body: RequestBody, limit: usize) -> Result<Bytes, WireResponse> {
    body.collect_limited(limit).await.map_err(|e| match e {
        CollectError::TooLarge { limit } => {
            warn!(limit, "request body exceed the limit");
            terminal(StatusCode::PAYLOAD_TOO_LARGE, "payload too large")
        }
        CollectError::Stream(e) => {
            warn!(cause = %e, "can't read request body");
            terminal(StatusCode::BAD_REQUEST, "invalid body")
        }
    })
}

pub(crate) fn expect_success(response: &http::Response<Bytes>) -> Result<(), DecodeError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(DecodeError::unexpected_status(response.status(), response.body().clone()))
    }
}

pub(crate) fn content_response(content_type: HeaderValue, bytes: impl Into<Bytes>) -> WireResponse {
    let bytes: Bytes = bytes.into();
    let mut response = WireResponse::new(ResponseBody::once(bytes));
    response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
    response
}
