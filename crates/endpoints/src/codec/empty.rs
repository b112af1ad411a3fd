use crate::body::{RequestBody, ResponseBody, WireResponse};
use crate::codec::{BodyCodec, EncodedBody, ResponseDecoder, ResponseEncoder, expect_success};
use crate::error::{DecodeError, EncodeError};
use async_trait::async_trait;
use bytes::Bytes;

/// No content.
///
/// As a request body the payload is never read, whatever the peer sent. As a response it is a
/// `200 OK` without body.
#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

pub fn empty() -> Empty {
    Empty
}

#[async_trait]
impl BodyCodec for Empty {
    type Output = ();

    async fn decode_body(&self, _body: RequestBody) -> Result<Self::Output, WireResponse> {
        Ok(())
    }

    fn encode_body(&self, _value: Self::Output) -> Result<EncodedBody, EncodeError> {
        Ok(EncodedBody::default())
    }
}

impl ResponseEncoder for Empty {
    type Value = ();

    fn encode_response(&self, _value: Self::Value) -> WireResponse {
        WireResponse::new(ResponseBody::empty())
    }
}

impl ResponseDecoder for Empty {
    type Value = ();

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        expect_success(&response)
    }
}
