use crate::body::WireResponse;
use crate::codec::{ResponseDecoder, ResponseEncoder};
use crate::error::DecodeError;
use crate::rejection::terminal;
use bytes::Bytes;
use http::StatusCode;

/// Sends the inner response with a fixed status, e.g. `201 Created`.
///
/// On the client side any other status is an [`DecodeError::UnexpectedStatus`].
#[derive(Debug, Clone, Copy)]
pub struct WithStatus<R> {
    status: StatusCode,
    inner: R,
}

pub fn with_status<R>(status: StatusCode, inner: R) -> WithStatus<R> {
    WithStatus { status, inner }
}

impl<R: ResponseEncoder> ResponseEncoder for WithStatus<R> {
    type Value = R::Value;

    fn encode_response(&self, value: Self::Value) -> WireResponse {
        let mut response = self.inner.encode_response(value);
        if response.status().is_success() {
            *response.status_mut() = self.status;
        }
        response
    }
}

impl<R: ResponseDecoder> ResponseDecoder for WithStatus<R> {
    type Value = R::Value;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        if response.status() != self.status {
            let status = response.status();
            return Err(DecodeError::unexpected_status(status, response.into_body()));
        }
        self.inner.decode_response(response)
    }
}

/// `None` is sent as an empty `404 Not Found`, and a `404` is read back as `None`.
#[derive(Debug, Clone, Copy)]
pub struct OrNotFound<R> {
    inner: R,
}

pub fn or_not_found<R>(inner: R) -> OrNotFound<R> {
    OrNotFound { inner }
}

impl<R: ResponseEncoder> ResponseEncoder for OrNotFound<R> {
    type Value = Option<R::Value>;

    fn encode_response(&self, value: Self::Value) -> WireResponse {
        match value {
            Some(value) => self.inner.encode_response(value),
            None => terminal(StatusCode::NOT_FOUND, ""),
        }
    }
}

impl<R: ResponseDecoder> ResponseDecoder for OrNotFound<R> {
    type Value = Option<R::Value>;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.inner.decode_response(response).map(Some)
    }
}
