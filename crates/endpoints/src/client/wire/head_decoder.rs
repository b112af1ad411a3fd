//! Decoder for the status line and headers of a response.

use crate::error::TransportError;
use crate::utils::ensure;
use bytes::{Buf, Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Maximum number of headers allowed in a response
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the response head
pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
}

impl ResponseHead {
    pub(crate) fn into_response(self, body: Bytes) -> http::Response<Bytes> {
        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[derive(Debug, Default)]
pub(crate) struct HeadDecoder;

impl Decoder for HeadDecoder {
    type Item = ResponseHead;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut response = httparse::Response::new(&mut headers);

        let len = match response.parse(src).map_err(TransportError::invalid_response)? {
            Status::Complete(len) => len,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, TransportError::invalid_response("response head too large"));
                return Ok(None);
            }
        };
        trace!(head_size = len, "parsed response head");

        let status = response
            .code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| TransportError::invalid_response("invalid status code"))?;

        let mut header_map = HeaderMap::with_capacity(response.headers.len());
        for header in response.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(TransportError::invalid_response)?;
            let value = HeaderValue::from_bytes(header.value).map_err(TransportError::invalid_response)?;
            header_map.append(name, value);
        }

        src.advance(len);
        Ok(Some(ResponseHead { status, headers: header_map }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_head() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 201 Created\r\nx-id: 7\r\nx-id: 8\r\n\r\nbody"[..]);
        let head = HeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.status, StatusCode::CREATED);
        assert_eq!(head.headers.get_all("x-id").iter().count(), 2);
        assert_eq!(&buf[..], b"body");
    }

    #[test]
    fn partial_head_waits() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\ncontent-le"[..]);
        assert!(HeadDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 27);
    }

    #[test]
    fn oversized_head() {
        let mut raw = b"HTTP/1.1 200 OK\r\nx-big: ".to_vec();
        raw.resize(MAX_HEADER_BYTES + 1, b'a');
        let mut buf = BytesMut::from(&raw[..]);
        assert!(matches!(HeadDecoder.decode(&mut buf), Err(TransportError::InvalidResponse { .. })));
    }
}
