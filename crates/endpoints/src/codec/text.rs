use crate::body::{RequestBody, WireResponse};
use crate::codec::{
    BodyCodec, DEFAULT_BODY_LIMIT, EncodedBody, ResponseDecoder, ResponseEncoder, collect, content_response,
    expect_success,
};
use crate::error::{DecodeError, EncodeError};
use crate::rejection::terminal;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, StatusCode};

static TEXT_PLAIN_UTF_8: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
static APPLICATION_OCTET_STREAM: HeaderValue = HeaderValue::from_static("application/octet-stream");

/// An utf-8 text body.
#[derive(Debug, Clone, Copy)]
pub struct Text {
    limit: usize,
}

pub fn text() -> Text {
    Text { limit: DEFAULT_BODY_LIMIT }
}

impl Text {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl BodyCodec for Text {
    type Output = String;

    async fn decode_body(&self, body: RequestBody) -> Result<Self::Output, WireResponse> {
        let bytes = collect(body, self.limit).await?;
        String::from_utf8(bytes.into()).map_err(|_| terminal(StatusCode::BAD_REQUEST, "request body is not utf8"))
    }

    fn encode_body(&self, value: Self::Output) -> Result<EncodedBody, EncodeError> {
        Ok(EncodedBody::new(Some(TEXT_PLAIN_UTF_8.clone()), value))
    }
}

impl ResponseEncoder for Text {
    type Value = String;

    fn encode_response(&self, value: Self::Value) -> WireResponse {
        content_response(TEXT_PLAIN_UTF_8.clone(), value)
    }
}

impl ResponseDecoder for Text {
    type Value = String;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        expect_success(&response)?;
        let status = response.status();
        let body = response.into_body();
        String::from_utf8(body.to_vec()).map_err(|e| DecodeError::malformed(status, body, e))
    }
}

/// Raw bytes, passed through untouched.
#[derive(Debug, Clone, Copy)]
pub struct Raw {
    limit: usize,
}

pub fn raw() -> Raw {
    Raw { limit: DEFAULT_BODY_LIMIT }
}

impl Raw {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl BodyCodec for Raw {
    type Output = Bytes;

    async fn decode_body(&self, body: RequestBody) -> Result<Self::Output, WireResponse> {
        collect(body, self.limit).await
    }

    fn encode_body(&self, value: Self::Output) -> Result<EncodedBody, EncodeError> {
        Ok(EncodedBody::new(Some(APPLICATION_OCTET_STREAM.clone()), value))
    }
}

impl ResponseEncoder for Raw {
    type Value = Bytes;

    fn encode_response(&self, value: Self::Value) -> WireResponse {
        content_response(APPLICATION_OCTET_STREAM.clone(), value)
    }
}

impl ResponseDecoder for Raw {
    type Value = Bytes;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        expect_success(&response)?;
        Ok(response.into_body())
    }
}
