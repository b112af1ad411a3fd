//! A minimal HTTP/1.1 client transport over plain TCP.
//!
//! One connection per request, sent with `Connection: close`. The response is read through a
//! `FramedRead` driving [`MessageDecoder`], which parses the head with `httparse` and frames the
//! body by `Transfer-Encoding: chunked`, `Content-Length`, or the peer closing the connection.

use crate::client::Transport;
use crate::client::wire::{Frame, MessageDecoder, PayloadItem};
use crate::error::TransportError;
use crate::utils::ensure;
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{Method, Uri};
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::trace;

/// Settings of a [`TcpTransport`].
///
/// Every field has a default, so a partial config file is enough:
///
/// ```
/// use micro_endpoints::client::TransportConfig;
///
/// let config: TransportConfig = serde_json::from_str(r#"{ "request_timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.request_timeout_ms, 500);
/// assert_eq!(config.connect_timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: u64,
    /// Covers writing the request and reading the whole response.
    pub request_timeout_ms: u64,
    pub max_response_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { connect_timeout_ms: 5_000, request_timeout_ms: 30_000, max_response_size: 8 * 1024 * 1024 }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn exchange(
        &self,
        stream: &mut TcpStream,
        method: &Method,
        head: Vec<u8>,
        body: Bytes,
    ) -> Result<http::Response<Bytes>, TransportError> {
        stream.write_all(&head).await?;
        stream.write_all(&body).await?;
        stream.flush().await?;
        read_response(stream, method, self.config.max_response_size).await
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();
        let (host, port) = target(&parts.uri)?;

        let connect_timeout = self.config.connect_timeout();
        let mut stream = tokio::time::timeout(connect_timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_elapsed| TransportError::timeout(connect_timeout))?
            .map_err(TransportError::connect)?;
        trace!(%host, port, "connected");

        let head = encode_head(&parts, &host, port, body.len());
        let request_timeout = self.config.request_timeout();
        let exchange = self.exchange(&mut stream, &parts.method, head, body);
        let response = tokio::time::timeout(request_timeout, exchange)
            .await
            .map_err(|_elapsed| TransportError::timeout(request_timeout))??;
        trace!(status = %response.status(), size = response.body().len(), "response received");
        Ok(response)
    }
}

pub struct TcpTransportBuilder {
    config: TransportConfig,
}

impl TcpTransportBuilder {
    fn new() -> Self {
        Self { config: TransportConfig::default() }
    }

    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = duration_millis(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = duration_millis(timeout);
        self
    }

    pub fn max_response_size(mut self, max_size: usize) -> Self {
        self.config.max_response_size = max_size;
        self
    }

    pub fn build(self) -> TcpTransport {
        TcpTransport { config: self.config }
    }
}

impl std::fmt::Debug for TcpTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransportBuilder").field("config", &self.config).finish()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn target(uri: &Uri) -> Result<(String, u16), TransportError> {
    match uri.scheme_str() {
        Some("http") => {}
        Some(scheme) => return Err(TransportError::invalid_uri(format!("unsupported scheme '{scheme}'"))),
        None => return Err(TransportError::invalid_uri(format!("'{uri}' is not absolute"))),
    }
    let host = uri.host().ok_or_else(|| TransportError::invalid_uri(format!("'{uri}' has no host")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
    Ok((host, uri.port_u16().unwrap_or(80)))
}

fn encode_head(parts: &http::request::Parts, host: &str, port: u16, content_length: usize) -> Vec<u8> {
    let path = parts.uri.path_and_query().map_or("/", |path| path.as_str());

    let mut head = Vec::with_capacity(256);
    head.put_slice(format!("{} {} HTTP/1.1\r\n", parts.method, path).as_bytes());
    match parts.uri.authority() {
        Some(authority) => head.put_slice(format!("host: {authority}\r\n").as_bytes()),
        None => head.put_slice(format!("host: {host}:{port}\r\n").as_bytes()),
    }
    for (name, value) in &parts.headers {
        if name == HOST || name == CONTENT_LENGTH || name == CONNECTION || name == TRANSFER_ENCODING {
            continue;
        }
        head.put_slice(name.as_str().as_bytes());
        head.put_slice(b": ");
        head.put_slice(value.as_bytes());
        head.put_slice(b"\r\n");
    }
    head.put_slice(format!("content-length: {content_length}\r\nconnection: close\r\n\r\n").as_bytes());
    head
}

/// Reads one response to a `method` request, with a body of at most `max_size` bytes.
async fn read_response<R>(
    reader: R,
    method: &Method,
    max_size: usize,
) -> Result<http::Response<Bytes>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let decoder = MessageDecoder::new(method.clone(), max_size);
    let mut frames = FramedRead::with_capacity(reader, decoder, 8 * 1024);

    let head = match frames.next().await.transpose()? {
        Some(Frame::Head(head)) => head,
        Some(Frame::Payload(_)) | None => {
            return Err(TransportError::invalid_response("connection closed before the response head"));
        }
    };

    let mut body = BytesMut::new();
    loop {
        match frames.next().await.transpose()? {
            Some(Frame::Payload(PayloadItem::Chunk(bytes))) => {
                ensure!(body.len() + bytes.len() <= max_size, TransportError::ResponseTooLarge { max_size });
                body.extend_from_slice(&bytes);
            }
            Some(Frame::Payload(PayloadItem::Eof)) => break,
            Some(Frame::Head(_)) | None => {
                return Err(TransportError::invalid_response("connection closed before the body was complete"));
            }
        }
    }

    Ok(head.into_response(body.freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tokio::io::AsyncReadExt;

    async fn read(raw: &'static [u8], max_size: usize) -> Result<http::Response<Bytes>, TransportError> {
        read_response(raw, &Method::GET, max_size).await
    }

    #[tokio::test]
    async fn content_length_body() {
        let response = read(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nx-id: 7\r\n\r\n42", 1024).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-id"], "7");
        assert_eq!(response.body().as_ref(), b"42");
    }

    #[tokio::test]
    async fn chunked_body() {
        let raw = b"HTTP/1.1 201 Created\r\ntransfer-encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let response = read(raw, 1024).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"Wikipedia");
    }

    #[tokio::test]
    async fn body_until_close() {
        let response = read(b"HTTP/1.1 200 OK\r\n\r\nhello", 1024).await.unwrap();
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn no_content_ignores_trailing_bytes() {
        let response = read(b"HTTP/1.1 204 No Content\r\n\r\n", 1024).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn head_request_ignores_content_length() {
        let raw: &'static [u8] = b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\n";
        let response = read_response(raw, &Method::HEAD, 1024).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn body_split_across_reads() {
        let first: &'static [u8] = b"HTTP/1.1 200 OK\r\ntransfer-";
        let second: &'static [u8] = b"encoding: chunked\r\n\r\n3\r";
        let third: &'static [u8] = b"\nabc\r\n0\r\n\r\n";
        let reader = first.chain(second).chain(third);
        let response = read_response(reader, &Method::GET, 1024).await.unwrap();
        assert_eq!(response.body().as_ref(), b"abc");
    }

    #[tokio::test]
    async fn invalid_responses() {
        let truncated = read(b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\nshort", 1024).await;
        assert!(matches!(truncated, Err(TransportError::InvalidResponse { .. })));
        assert!(matches!(read(b"HTTP/1.1 200 OK\r\n", 1024).await, Err(TransportError::InvalidResponse { .. })));
        assert!(matches!(read(b"garbage\r\n\r\n", 1024).await, Err(TransportError::InvalidResponse { .. })));
        assert!(matches!(
            read(b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\nzz\r\n", 1024).await,
            Err(TransportError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn response_too_large() {
        assert!(matches!(
            read(b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello", 4).await,
            Err(TransportError::ResponseTooLarge { max_size: 4 })
        ));
        assert!(matches!(
            read(b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n", 4).await,
            Err(TransportError::ResponseTooLarge { max_size: 4 })
        ));
    }

    #[test]
    fn request_head() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("http://127.0.0.1:8080/items?x=1")
            .header("authorization", "token")
            .header("content-length", "999")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let head = String::from_utf8(encode_head(&parts, "127.0.0.1", 8080, 3)).unwrap();
        assert_eq!(
            head,
            concat!(
                "POST /items?x=1 HTTP/1.1\r\n",
                "host: 127.0.0.1:8080\r\n",
                "authorization: token\r\n",
                "content-length: 3\r\n",
                "connection: close\r\n\r\n",
            )
        );
    }

    #[test]
    fn only_absolute_http_uris() {
        assert_eq!(target(&Uri::from_static("http://localhost/a")).unwrap(), ("localhost".to_string(), 80));
        assert_eq!(target(&Uri::from_static("http://[::1]:81/")).unwrap(), ("::1".to_string(), 81));
        assert!(matches!(target(&Uri::from_static("https://localhost/")), Err(TransportError::InvalidUri { .. })));
        assert!(matches!(target(&Uri::from_static("/relative")), Err(TransportError::InvalidUri { .. })));
    }

    #[test]
    fn builder_overrides_defaults() {
        let transport = TcpTransport::builder()
            .connect_timeout(Duration::from_millis(100))
            .max_response_size(1024)
            .build();
        assert_eq!(transport.config().connect_timeout(), Duration::from_millis(100));
        assert_eq!(transport.config().request_timeout_ms, TransportConfig::default().request_timeout_ms);
        assert_eq!(transport.config().max_response_size, 1024);
    }
}
