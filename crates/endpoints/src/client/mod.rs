//! The client side: issuing an endpoint's request and decoding its response.
//!
//! [`Client::issue`] has two failure channels, nested on purpose:
//!
//! - the outer `Result` fails when the request could not be built or the round trip did not
//!   complete ([`IssueError`]), which is usually worth retrying,
//! - the inner `Result` fails when a response arrived but is not what the endpoint describes
//!   ([`DecodeError`]), which retrying will not fix.

mod local;
mod tcp;
mod wire;

pub use local::LocalTransport;
pub use tcp::{TcpTransport, TcpTransportBuilder, TransportConfig};

use crate::codec::ResponseDecoder;
use crate::endpoint::Endpoint;
use crate::error::{DecodeError, EncodeError, IssueError, TransportError};
use crate::request::RequestProtocol;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

/// Sends a fully built request and returns the fully buffered response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        (**self).send(request).await
    }
}

#[derive(Debug, Clone)]
pub struct Client<T> {
    base_url: String,
    transport: T,
}

impl<T: Transport> Client<T> {
    /// Creates a client prefixing every endpoint url with `base_url`, e.g. `http://127.0.0.1:8080`.
    ///
    /// An empty base url keeps the origin-form urls produced by the endpoints.
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encodes `value` with the endpoint's request protocol, sends it and decodes the response.
    pub async fn issue<Req, Resp>(
        &self,
        endpoint: &Endpoint<Req, Resp>,
        value: Req::Output,
    ) -> Result<Result<Resp::Value, DecodeError>, IssueError>
    where
        Req: RequestProtocol,
        Resp: ResponseDecoder,
    {
        let mut request = endpoint.request().encode(value)?;
        if !self.base_url.is_empty() {
            let target = format!("{}{}", self.base_url, request.uri());
            *request.uri_mut() = target.parse().map_err(EncodeError::from)?;
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(%method, %uri, "issuing request");

        let response = self
            .transport
            .send(request)
            .await
            .inspect_err(|e| warn!(%method, %uri, cause = %e, "request failed"))?;

        let status = response.status();
        let decoded = endpoint.response().decode_response(response);
        if let Err(e) = &decoded {
            warn!(%method, %uri, %status, cause = %e, "can't decode response");
        }
        Ok(decoded)
    }
}
