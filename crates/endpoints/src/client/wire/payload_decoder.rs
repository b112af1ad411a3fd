//! Decoder for response bodies.
//!
//! The framing is picked from the request method, the status and the headers, in the order
//! RFC 9112 section 6.3 gives:
//! - no body for `HEAD` requests and 1xx, 204 and 304 responses
//! - chunked when `Transfer-Encoding` ends with `chunked`
//! - `Content-Length` bytes
//! - otherwise everything until the peer closes the connection

use crate::client::wire::head_decoder::{MAX_HEADER_BYTES, ResponseHead};
use crate::error::TransportError;
use crate::utils::ensure;
use bytes::{Buf, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{Method, StatusCode};
use httparse::Status;
use std::cmp;
use tokio_util::codec::Decoder;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PayloadItem {
    Chunk(Bytes),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Remaining bytes of a `Content-Length` body
    Length(u64),
    Chunked(ChunkedState),
    UntilClose,
    NoBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the size line of the next chunk
    Size,
    /// Read the remaining bytes of the current chunk
    Data(u64),
    /// Read the CRLF closing a chunk
    DataEnd,
    /// Skip trailer fields after the last chunk
    Trailer,
    End,
}

impl PayloadDecoder {
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub(crate) fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedState::Size) }
    }

    pub(crate) fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(size) }
    }

    pub(crate) fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    /// Picks the decoder for the body following `head`, rejecting declared lengths above `max_size`.
    pub(crate) fn for_response(method: &Method, head: &ResponseHead, max_size: usize) -> Result<Self, TransportError> {
        let status = head.status;
        if *method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            return Ok(Self::empty());
        }

        if let Some(encoding) = head.headers.get(TRANSFER_ENCODING) {
            let chunked = encoding
                .to_str()
                .map_err(TransportError::invalid_response)?
                .rsplit(',')
                .next()
                .is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"));
            return Ok(if chunked { Self::chunked() } else { Self::until_close() });
        }

        let Some(value) = head.headers.get(CONTENT_LENGTH) else {
            return Ok(Self::until_close());
        };
        let length: u64 = value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .ok_or_else(|| TransportError::invalid_response("invalid content-length"))?;
        ensure!(length <= max_size as u64, TransportError::ResponseTooLarge { max_size });
        Ok(Self::fix_length(length))
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::NoBody | Kind::Length(0) => Ok(Some(PayloadItem::Eof)),
            Kind::Length(remaining) => {
                if src.is_empty() {
                    return Ok(None);
                }
                let len = cmp::min(*remaining, src.len() as u64);
                let bytes = src.split_to(len as usize).freeze();
                *remaining -= len;
                Ok(Some(PayloadItem::Chunk(bytes)))
            }
            Kind::UntilClose => Ok((!src.is_empty()).then(|| PayloadItem::Chunk(src.split().freeze()))),
            Kind::Chunked(state) => decode_chunked(state, src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        match self.kind {
            Kind::UntilClose => Ok(Some(PayloadItem::Eof)),
            _ => Err(TransportError::invalid_response("connection closed before the body was complete")),
        }
    }
}

fn decode_chunked(state: &mut ChunkedState, src: &mut BytesMut) -> Result<Option<PayloadItem>, TransportError> {
    loop {
        match *state {
            ChunkedState::Size => match httparse::parse_chunk_size(src) {
                Ok(Status::Complete((consumed, size))) => {
                    src.advance(consumed);
                    *state = if size == 0 { ChunkedState::Trailer } else { ChunkedState::Data(size) };
                }
                Ok(Status::Partial) => return Ok(None),
                Err(_) => return Err(TransportError::invalid_response("invalid chunk size")),
            },
            ChunkedState::Data(remaining) => {
                if src.is_empty() {
                    return Ok(None);
                }
                let len = cmp::min(remaining, src.len() as u64);
                let bytes = src.split_to(len as usize).freeze();
                *state = if remaining == len { ChunkedState::DataEnd } else { ChunkedState::Data(remaining - len) };
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
            ChunkedState::DataEnd => {
                if src.len() < 2 {
                    return Ok(None);
                }
                ensure!(&src[..2] == b"\r\n", TransportError::invalid_response("chunk not terminated by CRLF"));
                src.advance(2);
                *state = ChunkedState::Size;
            }
            // trailer fields are skipped line by line until the empty line
            ChunkedState::Trailer => match src.windows(2).position(|w| w == b"\r\n") {
                Some(0) => {
                    src.advance(2);
                    *state = ChunkedState::End;
                }
                Some(line) => src.advance(line + 2),
                None => {
                    ensure!(src.len() <= MAX_HEADER_BYTES, TransportError::invalid_response("trailer too large"));
                    return Ok(None);
                }
            },
            ChunkedState::End => {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    fn head(status: StatusCode, headers: &[(&'static str, &'static str)]) -> ResponseHead {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, value.parse().unwrap());
        }
        ResponseHead { status, headers: map }
    }

    fn drain(decoder: &mut PayloadDecoder, buf: &mut BytesMut) -> Vec<PayloadItem> {
        let mut items = vec![];
        while let Some(item) = decoder.decode(buf).unwrap() {
            let eof = item == PayloadItem::Eof;
            items.push(item);
            if eof {
                break;
            }
        }
        items
    }

    #[test]
    fn framing_selection() {
        let sized = head(StatusCode::OK, &[("content-length", "5")]);
        assert_eq!(PayloadDecoder::for_response(&Method::GET, &sized, 64).unwrap(), PayloadDecoder::fix_length(5));
        assert_eq!(PayloadDecoder::for_response(&Method::HEAD, &sized, 64).unwrap(), PayloadDecoder::empty());

        let chunked = head(StatusCode::OK, &[("transfer-encoding", "gzip, chunked"), ("content-length", "5")]);
        assert_eq!(PayloadDecoder::for_response(&Method::GET, &chunked, 64).unwrap(), PayloadDecoder::chunked());

        let bare = head(StatusCode::OK, &[]);
        assert_eq!(PayloadDecoder::for_response(&Method::GET, &bare, 64).unwrap(), PayloadDecoder::until_close());

        let not_modified = head(StatusCode::NOT_MODIFIED, &[("content-length", "5")]);
        assert_eq!(PayloadDecoder::for_response(&Method::GET, &not_modified, 64).unwrap(), PayloadDecoder::empty());
    }

    #[test]
    fn framing_rejects_bad_lengths() {
        let invalid = head(StatusCode::OK, &[("content-length", "five")]);
        assert!(matches!(
            PayloadDecoder::for_response(&Method::GET, &invalid, 64),
            Err(TransportError::InvalidResponse { .. })
        ));

        let large = head(StatusCode::OK, &[("content-length", "65")]);
        assert!(matches!(
            PayloadDecoder::for_response(&Method::GET, &large, 64),
            Err(TransportError::ResponseTooLarge { max_size: 64 })
        ));
    }

    #[test]
    fn length_stops_at_declared_size() {
        let mut buf = BytesMut::from(&b"1012345678rest"[..]);
        let items = drain(&mut PayloadDecoder::fix_length(10), &mut buf);
        assert_eq!(items, vec![PayloadItem::Chunk(Bytes::from_static(b"1012345678")), PayloadItem::Eof]);
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn chunked_with_extension_and_trailer() {
        let mut buf = BytesMut::from(&b"4;name=v\r\nWiki\r\n5\r\npedia\r\n0\r\nexpires: never\r\n\r\n"[..]);
        let items = drain(&mut PayloadDecoder::chunked(), &mut buf);
        assert_eq!(
            items,
            vec![
                PayloadItem::Chunk(Bytes::from_static(b"Wiki")),
                PayloadItem::Chunk(Bytes::from_static(b"pedia")),
                PayloadItem::Eof
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn chunked_split_across_reads() {
        let mut decoder = PayloadDecoder::chunked();
        let mut buf = BytesMut::from(&b"6\r\nhel"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"hel"))));
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo!\r");
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"lo!"))));
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\n0\r\n\r\n");
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn chunk_without_crlf() {
        let mut buf = BytesMut::from(&b"2\r\nokxx"[..]);
        let mut decoder = PayloadDecoder::chunked();
        assert!(decoder.decode(&mut buf).unwrap().is_some());
        assert!(matches!(decoder.decode(&mut buf), Err(TransportError::InvalidResponse { .. })));
    }

    #[test]
    fn eof_handling() {
        let mut empty = BytesMut::new();
        assert_eq!(PayloadDecoder::until_close().decode_eof(&mut empty).unwrap(), Some(PayloadItem::Eof));
        assert!(matches!(
            PayloadDecoder::fix_length(3).decode_eof(&mut empty),
            Err(TransportError::InvalidResponse { .. })
        ));
        assert!(matches!(
            PayloadDecoder::chunked().decode_eof(&mut empty),
            Err(TransportError::InvalidResponse { .. })
        ));
    }
}
