//! Response framing for [`TcpTransport`](crate::client::TcpTransport).
//!
//! [`MessageDecoder`] is a [`Decoder`] yielding the response head first, then the body as
//! [`PayloadItem`]s up to [`PayloadItem::Eof`]. It is meant to be driven by a `FramedRead`
//! over the connection.

mod head_decoder;
mod payload_decoder;

pub(crate) use head_decoder::{HeadDecoder, ResponseHead};
pub(crate) use payload_decoder::{PayloadDecoder, PayloadItem};

use crate::error::TransportError;
use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;

#[derive(Debug)]
pub(crate) enum Frame {
    Head(ResponseHead),
    Payload(PayloadItem),
}

/// Decodes one response to a request sent with `method`.
#[derive(Debug)]
pub(crate) struct MessageDecoder {
    method: Method,
    max_size: usize,
    head_decoder: HeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl MessageDecoder {
    pub(crate) fn new(method: Method, max_size: usize) -> Self {
        Self { method, max_size, head_decoder: HeadDecoder, payload_decoder: None }
    }
}

impl Decoder for MessageDecoder {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            return Ok(payload_decoder.decode(src)?.map(Frame::Payload));
        }

        let Some(head) = self.head_decoder.decode(src)? else {
            return Ok(None);
        };
        self.payload_decoder = Some(PayloadDecoder::for_response(&self.method, &head, self.max_size)?);
        Ok(Some(Frame::Head(head)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        match &mut self.payload_decoder {
            Some(payload_decoder) => Ok(payload_decoder.decode_eof(src)?.map(Frame::Payload)),
            None => Err(TransportError::invalid_response("connection closed before the response head")),
        }
    }
}
