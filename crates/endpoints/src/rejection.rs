use crate::body::{ResponseBody, WireResponse};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

static TEXT_PLAIN_UTF_8: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

/// A terminal response recipe.
///
/// Header and body decoders keep one of these and turn it into a fresh [`WireResponse`] every
/// time they reject a request.
#[derive(Debug, Clone)]
pub struct Rejection {
    status: StatusCode,
    message: Bytes,
    headers: HeaderMap,
}

impl Rejection {
    pub fn new(status: StatusCode, message: impl Into<Bytes>) -> Self {
        Self { status, message: message.into(), headers: HeaderMap::new() }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn to_response(&self) -> WireResponse {
        let mut response = terminal(self.status, self.message.clone());
        for (name, value) in &self.headers {
            response.headers_mut().insert(name, value.clone());
        }
        response
    }
}

/// A plain text response with the given status.
pub fn terminal(status: StatusCode, message: impl Into<Bytes>) -> WireResponse {
    let message = message.into();
    let mut response = WireResponse::new(ResponseBody::once(message.clone()));
    *response.status_mut() = status;
    if !message.is_empty() {
        response.headers_mut().insert(CONTENT_TYPE, TEXT_PLAIN_UTF_8.clone());
    }
    response
}
